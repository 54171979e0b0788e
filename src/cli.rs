//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Save, restore, and transfer encrypted sets of browser cookies.
///
/// Presets are encrypted with a per-installation master secret kept in the
/// data directory. Cookies are read from and written to a Netscape-format
/// cookie file (`--cookie-file`).
#[derive(Parser, Debug)]
#[command(name = "cookie-presets")]
#[command(author, version)]
#[command(after_help = "Exit codes:\n  \
    0 = all cookies applied\n  \
    1 = partial success (some cookies failed)\n  \
    2 = complete failure")]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding the master secret and presets
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Netscape-format cookie file acting as the live cookie jar
    #[arg(long, value_name = "PATH", global = true)]
    pub cookie_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save the cookie file's cookies for a domain as a preset
    Save(SaveArgs),

    /// List preset names
    List,

    /// Print a preset's cookies as JSON
    Show {
        /// Preset name
        name: String,
    },

    /// Delete a preset
    Delete {
        /// Preset name
        name: String,
    },

    /// Rename a preset
    Rename {
        /// Current preset name
        old_name: String,
        /// New preset name
        new_name: String,
    },

    /// Write a preset's cookies into the cookie file for a target domain
    Apply {
        /// Preset name
        name: String,
        /// Domain the cookies are written to (e.g. .example.com)
        target_domain: String,
    },

    /// Export a preset's cookies
    Export(ExportArgs),

    /// Import cookies and write each one to its own domain
    Import(ImportArgs),

    /// Remove every cookie for a domain from the cookie file
    Clear {
        /// Domain to clear (subdomains included)
        domain: String,
    },

    /// Manage the master secret
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `save`.
#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Preset name
    pub name: String,

    /// Domain whose cookies are captured (subdomains included)
    #[arg(short, long)]
    pub domain: String,
}

/// Arguments for `export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Preset name
    pub name: String,

    /// Emit an encrypted envelope instead of plain JSON
    #[arg(long)]
    pub encrypted: bool,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for `import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// File to import, or `-` for stdin
    pub input: String,

    /// Input is an encrypted envelope
    #[arg(long)]
    pub encrypted: bool,
}

/// `key` subcommands.
#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Generate a new master secret (existing presets become unreadable)
    Reset {
        /// Confirm that existing presets may be lost
        #[arg(long)]
        yes: bool,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
}
