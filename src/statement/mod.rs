//! Statement templating.
//!
//! Caller SQL arrives dialect-agnostic, with every string literal wrapped in
//! a sentinel pair. Date-shaped literals are inlined as quoted SQL strings;
//! all other literals become positional `?` binds.

mod lexer;
mod templater;

pub use lexer::{is_date_literal, tokenize, Token};
pub use templater::{prepare, template, BoundStatement, PreparedQuery, StatementTemplater};

/// Sentinel the query composer wraps string literals in.
pub const DEFAULT_SENTINEL: &str = "__UTF8__";
