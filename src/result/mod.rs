//! Result materialization.
//!
//! Turns backend result sets into the canonical JSON tree: structured rows,
//! pre-rendered JSON rows, or a flattened explain plan.

mod fixes;
mod materialize;
pub mod sql_type;
mod value;

pub use fixes::{RowFixes, CONSTANT_COLUMN};
pub use materialize::{is_json_object_query, materialize, materialize_explain, try_materialize};
pub use sql_type::{type_code_for_name, SqlTypeClass};
pub use value::{ResultColumn, ResultSet, SqlValue};
