//! Host configuration for the callback core.
//!
//! # Responsibility
//! - Collect host-level knobs (log level/dir, remote fan-out) in one place.
//! - Normalize values the same way regardless of where they came from.
//!
//! # Invariants
//! - A `HostConfig` that passed `validate` can be handed to logging init
//!   and dispatcher construction without further checks.

use crate::event::network::MAX_FANOUT;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "CALLREF_LOG_LEVEL";
/// Environment variable enabling file logging in the given directory.
pub const ENV_LOG_DIR: &str = "CALLREF_LOG_DIR";
/// Environment variable overriding the remote fan-out limit.
pub const ENV_MAX_FANOUT: &str = "CALLREF_MAX_FANOUT";

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// One of `trace|debug|info|warn|error`.
    pub log_level: &'static str,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Fan-out limit attached to remote events.
    pub max_fanout: u16,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            max_fanout: MAX_FANOUT,
        }
    }
}

impl HostConfig {
    /// Reads overrides from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            config.log_dir = Some(normalize_log_dir(&dir)?);
        }
        if let Some(fanout) = lookup(ENV_MAX_FANOUT) {
            config.max_fanout = parse_max_fanout(&fanout)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(self.log_level)?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.display().to_string()));
            }
        }
        if self.max_fanout == 0 {
            return Err(ConfigError::InvalidMaxFanout("0".to_string()));
        }
        Ok(())
    }
}

/// Normalizes a log level string to its canonical lowercase form.
pub fn normalize_level(level: &str) -> Result<&'static str, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(ConfigError::UnsupportedLevel(other.to_string())),
    }
}

/// Validates that `log_dir` is a non-empty absolute path.
pub fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyLogDir);
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(ConfigError::RelativeLogDir(trimmed.to_string()));
    }
    Ok(path.to_path_buf())
}

fn parse_max_fanout(value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(fanout) if fanout > 0 => Ok(fanout),
        _ => Err(ConfigError::InvalidMaxFanout(value.trim().to_string())),
    }
}

/// Host configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedLevel(String),
    EmptyLogDir,
    RelativeLogDir(String),
    InvalidMaxFanout(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyLogDir => write!(f, "log_dir cannot be empty"),
            Self::RelativeLogDir(value) => {
                write!(f, "log_dir must be an absolute path, got `{value}`")
            }
            Self::InvalidMaxFanout(value) => {
                write!(f, "max fan-out must be an integer in 1..=65535, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}
