//! Metadata collection.
//!
//! This module turns a connection's JDBC-style metadata into an immutable
//! [`SchemaSnapshot`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          collect()                              │
//! │  catalogs → schemas → tables (types minus deny list)            │
//! │     │             │                                             │
//! │     │             └─ sub_schema(): dialect, federated source    │
//! │     │                  ├─ physical catalog/schema per table     │
//! │     │                  └─ primary / exported keys (non-fatal)   │
//! │     └─ columns per table → Type Normalizer                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use relbridge::connection::ConnectionManager;
//! use relbridge::metadata::collect;
//! use relbridge::observe::ExecContext;
//!
//! let ctx = ExecContext::default();
//! let conn = ConnectionManager::open(&descriptor, &ctx).await?;
//! let snapshot = collect(conn.as_ref(), &ctx).await?;
//! println!("{}", snapshot.to_json());
//! ```

mod collector;
mod introspector;
mod types;

pub use collector::{
    collect, collect_columns, collect_tables, effective_table_types, DENIED_TABLE_TYPES,
    EXTRA_TABLE_TYPES,
};
pub use introspector::SchemaIntrospector;
pub use types::*;
