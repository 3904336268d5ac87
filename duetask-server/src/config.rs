//! Configuration system for the duetask server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/duetask/config.toml`)
//! 4. Compiled defaults

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use duetask::conversation::IdentityNames;
use duetask::reminder::DEFAULT_REMINDER_TIME;

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The reminder time is not a valid `HH:MM` wall-clock time.
    #[error("invalid reminder time {0:?}, expected HH:MM")]
    InvalidReminderTime(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    reminder: ReminderFileConfig,
    identities: IdentitiesFileConfig,
}

/// `[server]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
}

/// `[reminder]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ReminderFileConfig {
    time: Option<String>,
}

/// `[identities]` section: display names of the two identities.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct IdentitiesFileConfig {
    a: Option<String>,
    b: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "duetask chat gateway server")]
pub struct ServerCliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "DUETASK_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/duetask/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Local time of the daily digest, `HH:MM`.
    #[arg(long)]
    pub reminder_time: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "DUETASK_LOG")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:8080`).
    pub bind_addr: String,
    /// Local wall-clock time of the daily digest.
    pub reminder_time: NaiveTime,
    /// Display names of the two identities.
    pub names: IdentityNames,
    /// Log level filter string.
    pub log_level: String,
    /// Optional log file.
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            reminder_time: DEFAULT_REMINDER_TIME,
            names: IdentityNames::default(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and a missing
    /// file is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the reminder time is malformed.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &ServerCliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let reminder_time = match cli.reminder_time.as_deref().or(file.reminder.time.as_deref()) {
            Some(raw) => parse_reminder_time(raw)?,
            None => defaults.reminder_time,
        };

        let names = IdentityNames::new(
            file.identities
                .a
                .clone()
                .unwrap_or_else(|| defaults.names.name(duetask_proto::Identity::A).to_string()),
            file.identities
                .b
                .clone()
                .unwrap_or_else(|| defaults.names.name(duetask_proto::Identity::B).to_string()),
        );

        Ok(Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            reminder_time,
            names,
            log_level: cli.log_level.clone(),
            log_file: cli.log_file.clone(),
        })
    }
}

/// Parses an `HH:MM` reminder time.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidReminderTime`] for anything else.
pub fn parse_reminder_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidReminderTime(raw.to_string()))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("duetask").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
