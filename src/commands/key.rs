//! Key command handlers.

use anyhow::{Result, bail};
use tracing::warn;

use crate::app::context::AppContext;

pub async fn run_key_reset_command(context: &AppContext, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!(
            "Resetting the master secret makes every saved preset unreadable; re-run with --yes to proceed"
        );
    }

    let preset_count = context.presets.list().await?.len();
    context.keys.reset().await?;
    if preset_count > 0 {
        warn!(
            presets = preset_count,
            "Existing presets can no longer be decrypted; delete or re-save them"
        );
    }
    println!("master secret regenerated");
    Ok(())
}
