//! Sentinel-marked query → parameterized statement.

use tracing::debug;

use super::lexer::{tokenize, Token};
use super::DEFAULT_SENTINEL;
use crate::connection::Connection;
use crate::error::{QueryExecutionError, TemplaterError};

/// Executable SQL plus the ordered values for its `?` markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundStatement {
    pub sql: String,
    /// Bound positionally, all as strings.
    pub params: Vec<String>,
}

impl BoundStatement {
    /// A statement with no bind values.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// A statement the connection has accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    pub statement: BoundStatement,
    /// Parameter count the engine reported.
    pub parameter_count: usize,
}

/// Rewrites sentinel-wrapped literals into inline dates or bind markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementTemplater {
    sentinel: String,
}

impl Default for StatementTemplater {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL)
    }
}

impl StatementTemplater {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Template a query without touching any connection.
    pub fn template(&self, query: &str) -> Result<BoundStatement, TemplaterError> {
        let tokens = tokenize(query, &self.sentinel)?;

        let mut sql = String::with_capacity(query.len());
        let mut params = Vec::new();
        for token in tokens {
            match token {
                Token::Text(text) => sql.push_str(text),
                Token::DateLiteral(date) => {
                    sql.push('\'');
                    sql.push_str(date);
                    sql.push('\'');
                }
                Token::Bind(value) => {
                    sql.push('?');
                    params.push(value.to_string());
                }
            }
        }

        Ok(BoundStatement { sql, params })
    }

    /// Template a query and prepare it against `conn`.
    ///
    /// The engine's parameter count must equal the number of bound values.
    pub async fn prepare(
        &self,
        query: &str,
        conn: &dyn Connection,
    ) -> Result<PreparedQuery, QueryExecutionError> {
        let statement = self.template(query)?;
        debug!(sql = %statement.sql, binds = statement.params.len(), "templated statement");

        let parameter_count = conn
            .prepare(&statement.sql)
            .await
            .map_err(QueryExecutionError::Prepare)?;
        if parameter_count != statement.params.len() {
            return Err(QueryExecutionError::ParameterCount {
                expected: parameter_count,
                bound: statement.params.len(),
            });
        }

        Ok(PreparedQuery {
            statement,
            parameter_count,
        })
    }
}

/// Template a query using the default sentinel.
///
/// # Examples
///
/// ```
/// use relbridge::statement::template;
///
/// let bound = template("select * from t where a = __UTF8__x__UTF8__").unwrap();
/// assert_eq!(bound.sql, "select * from t where a = ?");
/// assert_eq!(bound.params, vec!["x".to_string()]);
/// ```
pub fn template(query: &str) -> Result<BoundStatement, TemplaterError> {
    StatementTemplater::default().template(query)
}

/// Template and prepare a query using the default sentinel.
pub async fn prepare(
    query: &str,
    conn: &dyn Connection,
) -> Result<PreparedQuery, QueryExecutionError> {
    StatementTemplater::default().prepare(query, conn).await
}
