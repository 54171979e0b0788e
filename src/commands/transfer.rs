//! Transfer command handlers: export and import.

use std::io::{self, Read};

use anyhow::{Context, Result};
use cookie_presets::{apply_import, export_cookies, import_cookies};
use tracing::info;

use super::print_apply_summary;
use crate::ProcessExit;
use crate::app::context::AppContext;
use crate::app::exit_handler::exit_outcome_for;
use crate::cli::{ExportArgs, ImportArgs};

const STDIN_MARKER: &str = "-";

pub async fn run_export_command(context: &AppContext, args: &ExportArgs) -> Result<()> {
    let cookies = context.presets.load(&args.name).await?;
    let text = export_cookies(context.cipher(), &cookies, args.encrypted).await?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, format!("{text}\n"))
                .await
                .with_context(|| format!("Failed to write export file '{}'", path.display()))?;
            info!(
                path = %path.display(),
                cookies = cookies.len(),
                encrypted = args.encrypted,
                "Exported preset"
            );
        }
        None => println!("{text}"),
    }
    Ok(())
}

pub async fn run_import_command(context: &AppContext, args: &ImportArgs) -> Result<ProcessExit> {
    let jar = context.cookie_store()?;
    let text = read_import_input(&args.input).await?;
    let imported = import_cookies(context.cipher(), &text, args.encrypted).await?;
    info!(
        cookies = imported.cookies.len(),
        rejected = imported.rejected.len(),
        "Import parsed"
    );

    let result = apply_import(&jar, &imported).await;
    print_apply_summary(&result);
    Ok(exit_outcome_for(&result))
}

async fn read_import_input(input: &str) -> Result<String> {
    if input == STDIN_MARKER {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read import data from stdin")?;
        return Ok(buffer);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Cannot read import file '{input}'"))
}
