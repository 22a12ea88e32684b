//! Configuration for the ssedge client.
//!
//! TOML file in the platform config directory, layered with `SSEDGE_`
//! environment variables, and translation to
//! `ssedge_core::ControllerConfig`. File logging setup lives in
//! [`logging`].

pub mod logging;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ssedge_core::{ControllerConfig, DEFAULT_POLL_INTERVAL, MetricsAccess};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub metrics: MetricsSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Live metrics polling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricsSettings {
    /// Milliseconds between recurring fetches.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// SSH login for devices whose own settings are unknown.
    #[serde(default = "default_metrics_username")]
    pub username: String,

    #[serde(default)]
    pub strict_host_key_checking: bool,

    pub port: Option<u16>,

    pub connect_timeout_secs: Option<u64>,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            username: default_metrics_username(),
            strict_host_key_checking: false,
            port: None,
            connect_timeout_secs: None,
        }
    }
}

fn default_interval_ms() -> u64 {
    u64::try_from(DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(500)
}
fn default_metrics_username() -> String {
    MetricsAccess::default().username
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `"info"` or `"ssedge_core=debug"`.
    #[serde(default = "default_level")]
    pub level: String,

    /// Log file used when the backend does not report one.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> String {
    "info".into()
}

impl Config {
    /// Translate into the core controller's runtime configuration.
    pub fn to_controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        let metrics = &self.metrics;
        if metrics.interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "metrics.interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if metrics.port == Some(0) {
            return Err(ConfigError::Validation {
                field: "metrics.port".into(),
                reason: "must be between 1 and 65535".into(),
            });
        }
        if metrics.username.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "metrics.username".into(),
                reason: "must not be empty".into(),
            });
        }

        Ok(ControllerConfig {
            poll_interval: Duration::from_millis(metrics.interval_ms),
            metrics_defaults: MetricsAccess {
                username: metrics.username.clone(),
                port: metrics.port,
                strict_host_key_checking: metrics.strict_host_key_checking,
                connect_timeout_secs: metrics.connect_timeout_secs,
            },
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "ssedge", "ssedge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ssedge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` plus environment. A missing file yields defaults.
///
/// Environment keys nest with a double underscore:
/// `SSEDGE_METRICS__INTERVAL_MS=250`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SSEDGE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
