//! Configuration module for relbridge.
//!
//! Handles model descriptors, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{Driver, ModelDescriptor};
pub use settings::{
    expand_env_vars, ConnectionSettings, LoggingSettings, QuerySettings, Settings, SettingsError,
    WorkerSettings,
};
