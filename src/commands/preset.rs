//! Preset command handlers: save, list, show, delete, rename, apply, clear.

use anyhow::Result;
use cookie_presets::{apply_preset, clear_domain, export_cookies};
use tracing::info;

use super::print_apply_summary;
use crate::ProcessExit;
use crate::app::context::AppContext;
use crate::app::exit_handler::exit_outcome_for;
use crate::cli::SaveArgs;

pub async fn run_save_command(context: &AppContext, args: &SaveArgs) -> Result<()> {
    let jar = context.cookie_store()?;
    let saved = context
        .presets
        .capture(&args.name, &jar, &args.domain)
        .await?;
    if saved == 0 {
        info!(domain = %args.domain, "No cookies found for domain; saved an empty preset");
    }
    println!("saved '{}' ({saved} cookies)", args.name.trim());
    Ok(())
}

pub async fn run_list_command(context: &AppContext) -> Result<()> {
    let names = context.presets.list().await?;
    if names.is_empty() {
        info!("No presets saved yet");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

pub async fn run_show_command(context: &AppContext, name: &str) -> Result<()> {
    let cookies = context.presets.load(name).await?;
    println!("{}", export_cookies(context.cipher(), &cookies, false).await?);
    Ok(())
}

pub async fn run_delete_command(context: &AppContext, name: &str) -> Result<()> {
    context.presets.delete(name).await?;
    println!("deleted '{}'", name.trim());
    Ok(())
}

pub async fn run_rename_command(context: &AppContext, old_name: &str, new_name: &str) -> Result<()> {
    context.presets.rename(old_name, new_name).await?;
    println!("renamed '{}' -> '{}'", old_name.trim(), new_name.trim());
    Ok(())
}

pub async fn run_apply_command(
    context: &AppContext,
    name: &str,
    target_domain: &str,
) -> Result<ProcessExit> {
    let jar = context.cookie_store()?;
    let result = apply_preset(&context.presets, &jar, name, target_domain).await?;
    print_apply_summary(&result);
    Ok(exit_outcome_for(&result))
}

pub async fn run_clear_command(context: &AppContext, domain: &str) -> Result<ProcessExit> {
    let jar = context.cookie_store()?;
    let result = clear_domain(&jar, domain).await?;
    print_apply_summary(&result);
    Ok(exit_outcome_for(&result))
}
