//! Logging setup.
//!
//! Installs a `tracing-subscriber` writing to stderr or a file.
//!
//! ## Configuration priority
//!
//! 1. `RUST_LOG` environment variable
//! 2. `[logging] level` in the settings file
//! 3. Default: `relbridge=warn`
//!
//! `[logging] file` redirects output to a file regardless of the filter.

use std::sync::OnceLock;

use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingSettings;

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Pick the filter directive. `None` means logging is switched off.
fn filter_directive(settings: &LoggingSettings, rust_log: Option<String>) -> Option<String> {
    if let Some(env) = rust_log.filter(|v| !v.trim().is_empty()) {
        return Some(env);
    }
    match settings.level {
        Some(ref level) if level.eq_ignore_ascii_case("off") => None,
        Some(ref level) => Some(format!("relbridge={}", level.to_lowercase())),
        None => Some("relbridge=warn".to_string()),
    }
}

/// Initialize the tracing subscriber.
///
/// Only the first call per process has an effect.
pub fn init(settings: &LoggingSettings) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let Some(directive) = filter_directive(settings, std::env::var("RUST_LOG").ok()) else {
            return;
        };
        let filter = EnvFilter::new(directive);

        if let Some(ref path) = settings.file {
            let file = match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
            {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("relbridge: failed to open log file {}: {}", path, e);
                    return;
                }
            };

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::sync::Mutex::new(file))
                        .with_ansi(false)
                        .with_timer(SystemTime),
                )
                .try_init()
                .ok();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_timer(SystemTime),
                )
                .try_init()
                .ok();
        }
    });
}
