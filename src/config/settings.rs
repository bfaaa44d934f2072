//! TOML-based configuration for relbridge.
//!
//! Supports a config file (relbridge.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [connection]
//! driver = "sqlite"
//! model = "${DATA_DIR}/shop.db"
//!
//! [worker]
//! path = "./engine-worker"
//! timeout_secs = 30
//!
//! [query]
//! sentinel = "__UTF8__"
//! fixes = true
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::{Driver, ModelDescriptor};
use crate::statement::DEFAULT_SENTINEL;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("No [connection] section configured")]
    NoConnection,

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The data source to connect to.
    pub connection: Option<ConnectionSettings>,

    /// Engine worker configuration.
    pub worker: WorkerSettings,

    /// Query templating and result options.
    pub query: QuerySettings,

    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Driver name (sqlite, worker).
    pub driver: String,

    /// Model path or connection URL (supports ${ENV_VAR} expansion).
    pub model: String,
}

impl ConnectionSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        self.driver
            .parse()
            .map_err(|_| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Get the model location with environment variables expanded.
    pub fn resolved_model(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.model)
    }
}

/// Engine worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary.
    pub path: Option<String>,

    /// Extra command-line arguments for the worker.
    pub args: Vec<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

/// Query templating and result options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Delimiter the query composer wraps string literals in.
    pub sentinel: String,

    /// Post-process structured rows (null strings, CONSTANT column, missing fields).
    pub fixes: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            fixes: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: "off", "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,

    /// Log file path. If unset, logs go to stderr.
    pub file: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `RELBRIDGE_CONFIG`
    /// 2. `./relbridge.toml`
    /// 3. `~/.config/relbridge/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("RELBRIDGE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("relbridge.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("relbridge").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.query.sentinel.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "query.sentinel must not be empty".to_string(),
            ));
        }
        if self.query.sentinel.contains('?') || self.query.sentinel.contains('\'') {
            return Err(SettingsError::InvalidConfig(
                "query.sentinel must not contain '?' or quotes".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the model descriptor for the configured connection.
    pub fn descriptor(&self) -> Result<ModelDescriptor, SettingsError> {
        let connection = self.connection.as_ref().ok_or(SettingsError::NoConnection)?;
        let driver = connection.driver_type()?;
        let model = connection.resolved_model()?;

        let descriptor = match driver {
            Driver::Sqlite => ModelDescriptor::sqlite(model),
            Driver::Worker => {
                let path = match &self.worker.path {
                    Some(p) => expand_env_vars(p)?,
                    None => {
                        return Err(SettingsError::InvalidConfig(
                            "worker.path is required for the worker driver".to_string(),
                        ))
                    }
                };
                ModelDescriptor::worker(path, model)
                    .with_worker_args(self.worker.args.clone())
                    .with_timeout_secs(self.worker.timeout_secs)
            }
        };
        Ok(descriptor)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
