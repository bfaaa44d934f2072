//! Model descriptors.
//!
//! A [`ModelDescriptor`] identifies the data source a connection is opened
//! against: which driver to use and where its model lives.

use std::fmt;
use std::str::FromStr;

/// Supported source drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// SQLite database file (or `:memory:`).
    Sqlite,
    /// External engine process speaking the NDJSON worker protocol.
    Worker,
}

impl Driver {
    /// Get the driver name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::Worker => "worker",
        }
    }
}

impl FromStr for Driver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "worker" | "engine" => Ok(Driver::Worker),
            other => Err(format!("unsupported driver: {}", other)),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a data source to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Driver used to reach the source.
    pub driver: Driver,
    /// Model path or connection URL handed to the driver.
    pub model: String,
    /// Worker binary (worker driver only).
    pub worker_path: Option<String>,
    /// Extra worker arguments.
    pub worker_args: Vec<String>,
    /// Request timeout for the worker, in seconds.
    pub timeout_secs: u64,
}

impl ModelDescriptor {
    /// Descriptor for a SQLite database file.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: Driver::Sqlite,
            model: path.into(),
            worker_path: None,
            worker_args: Vec::new(),
            timeout_secs: 30,
        }
    }

    /// Descriptor for an in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self::sqlite(":memory:")
    }

    /// Descriptor for an engine worker serving the given model.
    pub fn worker(worker_path: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            driver: Driver::Worker,
            model: model.into(),
            worker_path: Some(worker_path.into()),
            worker_args: Vec::new(),
            timeout_secs: 30,
        }
    }

    pub fn with_worker_args(mut self, args: Vec<String>) -> Self {
        self.worker_args = args;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Whether this descriptor points at an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.driver == Driver::Sqlite && (self.model.is_empty() || self.model == ":memory:")
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.driver, self.model)
    }
}
