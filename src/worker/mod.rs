//! Worker communication module.
//!
//! Async communication with an external engine process that holds the actual
//! JDBC-style connection. The worker answers metadata calls and executes
//! statements; this crate stays engine-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    relbridge (Rust + Tokio)                     │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                    WorkerClient (Async)                   │  │
//! │  │  - Spawns the worker as child process                     │  │
//! │  │  - NDJSON protocol over stdin/stdout                      │  │
//! │  │  - Request IDs for response correlation                   │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                              │                                   │
//! │               stdin (NDJSON) │ stdout (NDJSON)                  │
//! │                              ▼                                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │         Engine Worker (Long-Running Child Process)              │
//! │   root schema, federated sub-connections, statement execution   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::{WorkerClient, DEFAULT_TIMEOUT_SECS};
pub use error::{WorkerError, WorkerResult};
