//! Application configuration loading for CLI defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cookie_presets::storage::default_data_dir;

use crate::cli::Cli;

const CONFIG_FILE_NAME: &str = "config.toml";

/// File configuration (`config.toml`) for CLI defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Directory holding the master secret and presets.
    pub data_dir: Option<PathBuf>,
    /// Default Netscape cookie file.
    pub cookie_file: Option<PathBuf>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerbositySetting {
    #[default]
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }

    /// Returns the tracing filter used when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }

    fn from_flags(verbose: u8, quiet: bool) -> Option<Self> {
        if quiet {
            return Some(Self::Quiet);
        }
        match verbose {
            0 => None,
            1 => Some(Self::Verbose),
            _ => Some(Self::Debug),
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Indicates whether configuration was loaded from disk.
    #[must_use]
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Settings after applying CLI flags over file config over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub data_dir: PathBuf,
    pub cookie_file: Option<PathBuf>,
    pub verbosity: VerbositySetting,
}

/// Resolves the default config path: `<default data dir>/config.toml`.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    default_data_dir()
        .ok()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

/// Merges CLI flags, file config, and built-in defaults.
pub fn resolve_settings(cli: &Cli, loaded: &LoadedConfig) -> Result<EffectiveSettings> {
    let file = loaded.config.clone().unwrap_or_default();

    let data_dir = match cli.data_dir.clone().or(file.data_dir) {
        Some(dir) => dir,
        None => default_data_dir().context(
            "Cannot determine a data directory; set XDG_CONFIG_HOME or HOME, or pass --data-dir",
        )?,
    };

    let verbosity = VerbositySetting::from_flags(cli.verbose, cli.quiet)
        .or(file.verbosity)
        .unwrap_or_default();

    Ok(EffectiveSettings {
        data_dir,
        cookie_file: cli.cookie_file.clone().or(file.cookie_file),
        verbosity,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "data_dir" => {
                let parsed = parse_path(value).with_context(|| {
                    format!("Invalid `data_dir` value on line {line_number}")
                })?;
                cfg.data_dir = Some(parsed);
            }
            "cookie_file" => {
                let parsed = parse_path(value).with_context(|| {
                    format!("Invalid `cookie_file` value on line {line_number}")
                })?;
                cfg.cookie_file = Some(parsed);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `verbosity` value on line {line_number}")
                })?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].replace("\\\\", "\\"))
}

fn parse_path(raw_value: &str) -> Result<PathBuf> {
    let parsed = parse_string_literal(raw_value)?;
    if parsed.trim().is_empty() {
        bail!("Expected a non-empty path");
    }
    Ok(PathBuf::from(parsed))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
