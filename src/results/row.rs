use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DbEngineError;
use crate::mapping::FromValue;
use crate::types::RowValues;

/// A row from a database query result
///
/// Column names and the name-to-index lookup are shared by every row of a
/// [`ResultSet`](super::ResultSet).
#[derive(Debug, Clone)]
pub struct DbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<RowValues>,
    column_index: Arc<HashMap<String, usize>>,
}

impl DbRow {
    /// Create a row with its own column index.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            values,
            column_index,
        }
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        values: Vec<RowValues>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Convert the named column into `T`.
    ///
    /// # Errors
    /// Returns `DbEngineError::MappingError` if the column is absent or the
    /// value cannot be converted.
    pub fn try_get<T: FromValue>(&self, column_name: &str) -> Result<T, DbEngineError> {
        let value = self.get(column_name).ok_or_else(|| {
            DbEngineError::MappingError(format!("column `{column_name}` not in result set"))
        })?;
        T::from_value(value).map_err(|e| match e {
            DbEngineError::MappingError(msg) => {
                DbEngineError::MappingError(format!("column `{column_name}`: {msg}"))
            }
            other => other,
        })
    }

    /// Like [`DbRow::try_get`], but an unselected column yields `T::default()`.
    ///
    /// # Errors
    /// Returns `DbEngineError::MappingError` if the value cannot be converted.
    pub fn get_or_default<T: FromValue + Default>(
        &self,
        column_name: &str,
    ) -> Result<T, DbEngineError> {
        if self.get_column_index(column_name).is_none() {
            return Ok(T::default());
        }
        self.try_get(column_name)
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}
