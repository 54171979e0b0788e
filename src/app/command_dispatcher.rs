//! CLI command routing: runs the handler for the parsed subcommand and
//! returns the exit outcome.

use anyhow::Result;

use crate::app::context::AppContext;
use crate::cli::{Command, ConfigCommand, KeyCommand};
use crate::{ProcessExit, commands};

pub(crate) async fn dispatch(command: &Command, context: &AppContext) -> Result<ProcessExit> {
    match command {
        Command::Save(args) => commands::run_save_command(context, args).await?,
        Command::List => commands::run_list_command(context).await?,
        Command::Show { name } => commands::run_show_command(context, name).await?,
        Command::Delete { name } => commands::run_delete_command(context, name).await?,
        Command::Rename { old_name, new_name } => {
            commands::run_rename_command(context, old_name, new_name).await?;
        }
        Command::Apply {
            name,
            target_domain,
        } => return commands::run_apply_command(context, name, target_domain).await,
        Command::Export(args) => commands::run_export_command(context, args).await?,
        Command::Import(args) => return commands::run_import_command(context, args).await,
        Command::Clear { domain } => return commands::run_clear_command(context, domain).await,
        Command::Key { command } => match command {
            KeyCommand::Reset { yes } => commands::run_key_reset_command(context, *yes).await?,
        },
        Command::Config { command } => match command {
            ConfigCommand::Show => commands::run_config_show_command(context),
        },
    }

    Ok(ProcessExit::Success)
}
