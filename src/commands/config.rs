//! Config command handlers: show effective configuration.

use crate::app::context::AppContext;

pub fn run_config_show_command(context: &AppContext) {
    let loaded_config = &context.loaded_config;
    let resolved_path = loaded_config.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded_config.loaded_from_file() {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!("data_dir = {}", context.data_dir().display());
    println!(
        "cookie_file = {}",
        context
            .settings
            .cookie_file
            .as_ref()
            .map_or_else(|| "<unset>".to_string(), |path| path.display().to_string())
    );
    println!("verbosity = {}", context.settings.verbosity.as_str());
}
