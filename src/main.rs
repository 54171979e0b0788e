//! CLI entry point for the cookie-presets tool.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod commands;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every cookie applied (or nothing to do).
    Success,
    /// Some cookies applied, some failed.
    Partial,
    /// Nothing applied, or the command itself failed.
    Failure,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_cookie_presets().await {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(ProcessExit::Failure.code())
        }
    }
}
