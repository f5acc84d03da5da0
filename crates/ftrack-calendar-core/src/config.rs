//! TOML-based configuration.
//!
//! Stores:
//! - Target calendar name, time zone and sharing
//! - ftrack server location
//! - Logging level and optional log directory
//!
//! Configuration is stored at `~/.config/ftrack-calendar/config.toml`.
//! Secrets are never read from the file: the ftrack API key and the Google
//! credential blob come from the environment only.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::calendar::google::DEFAULT_API_BASE;
use crate::error::ConfigError;

pub const FTRACK_SERVER_ENV: &str = "FTRACK_SERVER";
pub const FTRACK_API_USER_ENV: &str = "FTRACK_API_USER";
pub const FTRACK_API_KEY_ENV: &str = "FTRACK_API_KEY";

/// Calendar provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Display name of the shared calendar.
    #[serde(default = "default_calendar_name")]
    pub name: String,
    /// Time zone given to a newly created calendar.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Group address the calendar is shared with. Sharing is skipped when unset.
    #[serde(default)]
    pub share_group: Option<String>,
    #[serde(default = "default_share_role")]
    pub share_role: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtrackConfig {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub api_user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write rotated log files here in addition to stderr.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub ftrack: FtrackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Everything needed to open an ftrack session.
#[derive(Clone, PartialEq, Eq)]
pub struct FtrackCredentials {
    pub server_url: String,
    pub api_user: String,
    pub api_key: String,
}

impl std::fmt::Debug for FtrackCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtrackCredentials")
            .field("server_url", &self.server_url)
            .field("api_user", &self.api_user)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

// Default functions
fn default_calendar_name() -> String {
    "ftrack".into()
}
fn default_time_zone() -> String {
    "America/Los_Angeles".into()
}
fn default_share_role() -> String {
    "owner".into()
}
fn default_api_base() -> String {
    DEFAULT_API_BASE.into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            name: default_calendar_name(),
            time_zone: default_time_zone(),
            share_group: None,
            share_role: default_share_role(),
            api_base: default_api_base(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

/// Returns `~/.config/ftrack-calendar[-dev]/` based on FTRACK_CALENDAR_ENV.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join(".config");

    let env = std::env::var("FTRACK_CALENDAR_ENV").unwrap_or_else(|_| "production".to_string());
    Ok(if env == "dev" {
        base_dir.join("ftrack-calendar-dev")
    } else {
        base_dir.join("ftrack-calendar")
    })
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load from `path`, or return defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Apply non-secret environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(server) = lookup(FTRACK_SERVER_ENV).filter(|v| !v.is_empty()) {
            self.ftrack.server_url = Some(server);
        }
        if let Some(user) = lookup(FTRACK_API_USER_ENV).filter(|v| !v.is_empty()) {
            self.ftrack.api_user = Some(user);
        }
    }

    /// Resolve ftrack credentials; the API key only ever comes from `lookup`.
    pub fn ftrack_credentials(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<FtrackCredentials, ConfigError> {
        let server_url = self
            .ftrack
            .server_url
            .clone()
            .ok_or_else(|| ConfigError::MissingKey(format!("ftrack.server_url or {FTRACK_SERVER_ENV}")))?;
        let api_user = self
            .ftrack
            .api_user
            .clone()
            .ok_or_else(|| ConfigError::MissingKey(format!("ftrack.api_user or {FTRACK_API_USER_ENV}")))?;
        let api_key = lookup(FTRACK_API_KEY_ENV)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingKey(FTRACK_API_KEY_ENV.to_string()))?;
        Ok(FtrackCredentials {
            server_url,
            api_user,
            api_key,
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }
}

fn get_json_value_by_path<'a>(
    root: &'a serde_json::Value,
    key: &str,
) -> Option<&'a serde_json::Value> {
    if key.is_empty() {
        return None;
    }

    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}
