//! SQL text + parameter assembly for the CRUD verbs.
//!
//! Only identifiers (table and column names) are interpolated into the SQL
//! text; every value travels as a positional parameter. Identifiers are
//! assumed to come from the application, not from user input.

use crate::decorator::Decorator;
use crate::error::DbEngineError;
use crate::types::{Dialect, RowValues};

/// SQL text with its positional parameters, in bind order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub query: String,
    pub params: Vec<RowValues>,
}

impl Statement {
    #[must_use]
    pub fn new(query: impl Into<String>, params: Vec<RowValues>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }

    /// Statement with no parameters.
    #[must_use]
    pub fn without_params(query: impl Into<String>) -> Self {
        Self::new(query, Vec::new())
    }

    /// `SELECT <cols> FROM <table>` followed by the decorator clauses.
    ///
    /// # Errors
    /// Returns `DbEngineError::ParameterError` if `columns` is empty.
    pub fn select(
        dialect: Dialect,
        table: &str,
        columns: &[&str],
        decorator: Option<Decorator>,
    ) -> Result<Self, DbEngineError> {
        require_columns(columns)?;
        let query = format!("SELECT {} FROM {table}", columns.join(", "));
        Ok(Self::decorated(dialect, query, Vec::new(), decorator, ""))
    }

    /// `INSERT INTO <table> (<cols>) VALUES (?, ...)` followed by the
    /// decorator text, whose parameters bind after the values.
    ///
    /// # Errors
    /// Returns `DbEngineError::ParameterError` if the column and value counts
    /// differ or no column is given.
    pub fn insert(
        dialect: Dialect,
        table: &str,
        columns: &[&str],
        values: Vec<RowValues>,
        decorator: Option<Decorator>,
    ) -> Result<Self, DbEngineError> {
        require_matching(columns, &values)?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        let query = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        );
        Ok(Self::decorated(dialect, query, values, decorator, ""))
    }

    /// `UPDATE <table> SET c1=?, ..., cN=? ` followed by the decorator clauses.
    ///
    /// # Errors
    /// Returns `DbEngineError::ParameterError` if the column and value counts
    /// differ or no column is given.
    pub fn update(
        dialect: Dialect,
        table: &str,
        columns: &[&str],
        values: Vec<RowValues>,
        decorator: Option<Decorator>,
    ) -> Result<Self, DbEngineError> {
        require_matching(columns, &values)?;
        let query = format!("UPDATE {table} SET {}=? ", columns.join("=?, "));
        Ok(Self::decorated(dialect, query, values, decorator, ""))
    }

    /// `DELETE FROM <table>` followed by the decorator clauses and `;`.
    #[must_use]
    pub fn delete(dialect: Dialect, table: &str, decorator: Option<Decorator>) -> Self {
        let query = format!("DELETE FROM {table}");
        Self::decorated(dialect, query, Vec::new(), decorator, ";")
    }

    /// `SELECT COUNT(*) FROM <table>` followed by the decorator clauses.
    #[must_use]
    pub fn count(dialect: Dialect, table: &str, decorator: Option<Decorator>) -> Self {
        let query = format!("SELECT COUNT(*) FROM {table}");
        Self::decorated(dialect, query, Vec::new(), decorator, "")
    }

    fn decorated(
        dialect: Dialect,
        mut query: String,
        mut params: Vec<RowValues>,
        decorator: Option<Decorator>,
        terminator: &str,
    ) -> Self {
        if let Some(decorator) = decorator {
            let (text, extra) = decorator.into_parts(dialect);
            query.push(' ');
            query.push_str(&text);
            params.extend(extra);
        }
        query.push_str(terminator);
        tracing::debug!(sql = %query, params = params.len(), "built statement");
        Self { query, params }
    }
}

fn require_columns(columns: &[&str]) -> Result<(), DbEngineError> {
    if columns.is_empty() {
        return Err(DbEngineError::ParameterError(
            "at least one column is required".to_string(),
        ));
    }
    Ok(())
}

fn require_matching(columns: &[&str], values: &[RowValues]) -> Result<(), DbEngineError> {
    if columns.len() != values.len() {
        return Err(DbEngineError::ParameterError(format!(
            "columns and values length not equal ({} columns, {} values)",
            columns.len(),
            values.len()
        )));
    }
    require_columns(columns)
}
