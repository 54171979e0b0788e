//! Process startup: arguments, configuration, logging, then dispatch.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::app::context::AppContext;
use crate::app::{command_dispatcher, terminal};
use crate::app_config::{load_default_file_config, resolve_settings};
use crate::cli::Cli;
use crate::ProcessExit;

pub(crate) async fn run_cookie_presets() -> Result<ProcessExit> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let loaded_config = load_default_file_config()?;
    let settings = resolve_settings(&cli, &loaded_config)?;

    terminal::init_tracing(settings.verbosity.log_level());
    debug!(?cli, "CLI arguments parsed");
    debug!(
        data_dir = %settings.data_dir.display(),
        config_loaded = loaded_config.loaded_from_file(),
        "settings resolved"
    );

    let context = AppContext::new(settings, loaded_config);
    command_dispatcher::dispatch(&cli.command, &context).await
}
