//! CLI command handlers.

mod config;
mod key;
mod preset;
mod transfer;

pub use config::run_config_show_command;
pub use key::run_key_reset_command;
pub use preset::{
    run_apply_command, run_clear_command, run_delete_command, run_list_command,
    run_rename_command, run_save_command, run_show_command,
};
pub use transfer::{run_export_command, run_import_command};

use cookie_presets::ApplyResult;

/// Prints the `applied=N failed=M` summary and one line per failure.
fn print_apply_summary(result: &ApplyResult) {
    println!(
        "applied={} failed={}",
        result.applied_count, result.failed_count
    );
    for failure in &result.failures {
        println!(
            "  failed: {} ({}): {}",
            failure.cookie_name, failure.kind, failure.reason
        );
    }
}
