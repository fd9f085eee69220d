//! Generic row-to-struct mapping.
//!
//! A destination type declares which columns it binds through
//! [`FromRow::COLUMNS`] and builds itself from a [`DbRow`]. The
//! [`impl_from_row!`](crate::impl_from_row) macro writes both for a plain
//! struct:
//!
//! ```rust
//! use db_engine::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Test {
//!     id: i64,
//!     value: String,
//! }
//!
//! db_engine::impl_from_row!(Test { id: "id", value: "value" });
//!
//! assert_eq!(<Test as FromRow>::COLUMNS, &["id", "value"]);
//! ```

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::DbEngineError;
use crate::results::{DbRow, ResultSet};
use crate::types::RowValues;

/// Build `Self` from one result row.
pub trait FromRow: Sized {
    /// Column names this type can bind. Every selected column must appear here.
    const COLUMNS: &'static [&'static str];

    /// Construct one value from `row`.
    ///
    /// # Errors
    /// Returns `DbEngineError::MappingError` if a value cannot be converted.
    fn from_row(row: &DbRow) -> Result<Self, DbEngineError>;
}

/// Conversion from a column value into a field type.
pub trait FromValue: Sized {
    /// # Errors
    /// Returns `DbEngineError::MappingError` when `value` has an incompatible type.
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError>;
}

fn mismatch(expected: &str, value: &RowValues) -> DbEngineError {
    DbEngineError::MappingError(format!("expected {expected}, found {}", value.kind()))
}

impl FromValue for RowValues {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        value.as_int().copied().ok_or_else(|| mismatch("int", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide)
            .map_err(|_| DbEngineError::MappingError(format!("{wide} does not fit in i32")))
    }
}

impl FromValue for u32 {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        let wide = i64::from_value(value)?;
        u32::try_from(wide)
            .map_err(|_| DbEngineError::MappingError(format!("{wide} does not fit in u32")))
    }
}

impl FromValue for f64 {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        value.as_float().ok_or_else(|| mismatch("float", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        value.as_bool().copied().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for String {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| mismatch("text", value))
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        value.as_timestamp().ok_or_else(|| mismatch("timestamp", value))
    }
}

impl FromValue for JsonValue {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        match value {
            RowValues::JSON(json) => Ok(json.clone()),
            RowValues::Text(text) => serde_json::from_str(text)
                .map_err(|e| DbEngineError::MappingError(format!("invalid json: {e}"))),
            other => Err(mismatch("json", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        value
            .as_blob()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch("blob", value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &RowValues) -> Result<Self, DbEngineError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

/// Implement [`FromRow`] for a struct by listing `field: "column"` bindings.
///
/// Fields whose column is not part of the result set keep `Default::default()`.
#[macro_export]
macro_rules! impl_from_row {
    ($ty:ident { $($field:ident : $column:literal),+ $(,)? }) => {
        impl $crate::mapping::FromRow for $ty {
            const COLUMNS: &'static [&'static str] = &[$($column),+];

            fn from_row(
                row: &$crate::results::DbRow,
            ) -> ::std::result::Result<Self, $crate::error::DbEngineError> {
                Ok(Self {
                    $($field: row.get_or_default($column)?,)+
                })
            }
        }
    };
}

/// Append one `T` per row of `result_set` to `dest`.
///
/// Every column of the result set must be bound by `T::COLUMNS`. Processing
/// stops at the first failing row; rows mapped before it stay in `dest`.
///
/// # Errors
/// Returns `DbEngineError::MappingError` for an unbound column or a value that
/// does not convert.
pub fn map_rows_into<T: FromRow>(
    result_set: &ResultSet,
    dest: &mut Vec<T>,
) -> Result<usize, DbEngineError> {
    dest.reserve(result_set.len());
    let mut mapped = 0;
    for row in &result_set.results {
        if let Some(column) = unbound_column::<T>(row) {
            return Err(DbEngineError::MappingError(format!(
                "missing destination name {column} in {}",
                std::any::type_name::<T>()
            )));
        }
        dest.push(T::from_row(row)?);
        mapped += 1;
    }
    Ok(mapped)
}

fn unbound_column<T: FromRow>(row: &DbRow) -> Option<&str> {
    row.column_names
        .iter()
        .find(|name| !T::COLUMNS.contains(&name.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        id: i64,
        value: String,
        note: Option<String>,
    }

    crate::impl_from_row!(Item {
        id: "id",
        value: "value",
        note: "note",
    });

    fn result_set(columns: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
        let mut rs = ResultSet::with_capacity(rows.len());
        rs.set_column_names(Arc::new(columns.iter().map(|c| (*c).to_string()).collect()));
        for row in rows {
            rs.add_row_values(row);
        }
        rs
    }

    #[test]
    fn maps_zero_one_and_many_rows() {
        for n in [0usize, 1, 5] {
            let rows = (0..n)
                .map(|i| vec![RowValues::Int(i as i64), RowValues::Text(format!("v{i}"))])
                .collect();
            let rs = result_set(&["id", "value"], rows);
            let mut dest: Vec<Item> = Vec::new();
            assert_eq!(map_rows_into(&rs, &mut dest).unwrap(), n);
            assert_eq!(dest.len(), n);
        }
    }

    #[test]
    fn unselected_fields_default() {
        let rs = result_set(&["id"], vec![vec![RowValues::Int(7)]]);
        let mut dest: Vec<Item> = Vec::new();
        map_rows_into(&rs, &mut dest).unwrap();
        assert_eq!(
            dest,
            vec![Item {
                id: 7,
                value: String::new(),
                note: None
            }]
        );
    }

    #[test]
    fn unbound_column_fails_before_first_row() {
        let rs = result_set(
            &["id", "extra"],
            vec![vec![RowValues::Int(1), RowValues::Int(2)]],
        );
        let mut dest: Vec<Item> = Vec::new();
        let err = map_rows_into(&rs, &mut dest).unwrap_err();
        assert!(matches!(err, DbEngineError::MappingError(ref m) if m.contains("extra")));
        assert!(dest.is_empty());
    }

    #[test]
    fn conversion_error_keeps_earlier_rows() {
        let rs = result_set(
            &["id", "value"],
            vec![
                vec![RowValues::Int(1), RowValues::Text("a".into())],
                vec![RowValues::Text("oops".into()), RowValues::Text("b".into())],
                vec![RowValues::Int(3), RowValues::Text("c".into())],
            ],
        );
        let mut dest: Vec<Item> = Vec::new();
        assert!(map_rows_into(&rs, &mut dest).is_err());
        assert_eq!(dest.len(), 1);
        assert_eq!(dest[0].id, 1);
    }

    #[test]
    fn appends_to_existing_destination() {
        let rs = result_set(&["id", "value"], vec![vec![RowValues::Int(2), "b".into()]]);
        let mut dest = vec![Item {
            id: 1,
            ..Item::default()
        }];
        map_rows_into(&rs, &mut dest).unwrap();
        assert_eq!(dest.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn option_and_numeric_conversions() {
        assert_eq!(Option::<i64>::from_value(&RowValues::Null).unwrap(), None);
        assert_eq!(i32::from_value(&RowValues::Int(5)).unwrap(), 5);
        assert!(i32::from_value(&RowValues::Int(i64::MAX)).is_err());
        assert!(i64::from_value(&RowValues::Null).is_err());
        assert!(bool::from_value(&RowValues::Int(1)).unwrap());
        assert_eq!(f64::from_value(&RowValues::Int(2)).unwrap(), 2.0);
    }
}
