use mysql_async::{Params, Value};

use crate::types::RowValues;

/// Convert a single `RowValues` to a `mysql_async` value.
#[must_use]
pub fn row_value_to_mysql_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Int(*i),
        RowValues::Float(f) => Value::Double(*f),
        RowValues::Text(s) => Value::Bytes(s.clone().into_bytes()),
        RowValues::Bool(b) => Value::Int(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Bytes(dt.format("%F %T%.f").to_string().into_bytes()),
        RowValues::Null => Value::NULL,
        RowValues::JSON(jval) => Value::Bytes(jval.to_string().into_bytes()),
        RowValues::Blob(bytes) => Value::Bytes(bytes.clone()),
    }
}

/// Positional parameters for a prepared statement.
#[must_use]
pub fn convert_params(params: &[RowValues]) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::Positional(params.iter().map(row_value_to_mysql_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn converts_each_variant() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        let converted = convert_params(&[
            RowValues::Int(1),
            RowValues::Float(2.5),
            RowValues::Text("bob".into()),
            RowValues::Bool(false),
            RowValues::Timestamp(ts),
            RowValues::Null,
            RowValues::JSON(serde_json::json!({"a": 1})),
        ]);
        let Params::Positional(values) = converted else {
            panic!("expected positional params");
        };
        assert_eq!(
            values,
            vec![
                Value::Int(1),
                Value::Double(2.5),
                Value::Bytes(b"bob".to_vec()),
                Value::Int(0),
                Value::Bytes(b"2024-01-02 03:04:05".to_vec()),
                Value::NULL,
                Value::Bytes(b"{\"a\":1}".to_vec()),
            ]
        );
    }

    #[test]
    fn no_params_is_empty() {
        assert!(matches!(convert_params(&[]), Params::Empty));
    }
}
