// Module declarations
pub mod error;
pub mod value;
pub mod data_type;
pub mod column;
pub mod row;

// Re-exports for convenience
pub use error::{DriverError, Result};
pub use value::Value;
pub use data_type::FieldType;
pub use column::{ColumnInfo, ReservedField};
pub use row::Row;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiError;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "NULL");
        let date = NaiveDate::from_ymd_opt(2021, 3, 9).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2021-03-09");
        let ts = date.and_hms_opt(8, 5, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2021-03-09 08:05:00");
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(Value::Integer(7).to_json(), json!(7));
        assert_eq!(Value::from("abc").to_json(), json!("abc"));
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(Value::Date(date).to_json(), json!("2021-01-01"));
        assert_eq!(Value::Null.to_json(), json!(null));
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(Value::from(&json!(3)), Value::Integer(3));
        assert_eq!(Value::from(&json!(1.5)), Value::Real(1.5));
        assert_eq!(Value::from(&json!("x")), Value::Text("x".to_string()));
        assert_eq!(Value::from(&json!(false)), Value::Boolean(false));
        assert_eq!(Value::from(&json!(null)), Value::Null);
        assert_eq!(Value::from(&json!([1, 2])), Value::Text("[1,2]".to_string()));
    }

    #[test]
    fn test_merge_json_deep() {
        let mut base = json!({"body": {"track_scores": true, "sort": [{"a": 1}]}});
        row::merge_json(
            &mut base,
            json!({"body": {"query": {"x": 1}, "sort": [{"b": 2}]}, "size": 5}),
        );
        assert_eq!(
            base,
            json!({
                "body": {"track_scores": true, "sort": [{"a": 1}, {"b": 2}], "query": {"x": 1}},
                "size": 5
            })
        );
    }

    #[test]
    fn test_column_info_from_remote_field() {
        let field = json!({"id": 12, "alias": "title", "name": "Title", "type": "text"});
        let info = ColumnInfo::from_remote_field(&field);
        assert_eq!(info.column, "title");
        assert_eq!(info.name, "Title");
        assert_eq!(info.field_type, "text");
        assert_eq!(info.id, Some(json!(12)));

        let row = info.to_row();
        assert_eq!(row.get("column"), Some(&json!("title")));
        assert_eq!(row.get("type"), Some(&json!("text")));
    }

    #[test]
    fn test_reserved_field_builders() {
        let id = ReservedField::new("id", FieldType::Integer, "Primary key").autoincrement();
        assert!(id.not_null);
        assert!(id.autoincrement);

        let info = ColumnInfo::from_reserved(&id);
        assert_eq!(info.column, "id");
        assert_eq!(info.field_type, "integer");
        assert_eq!(info.comment.as_deref(), Some("Primary key"));
    }

    #[test]
    fn test_error_codes_and_messages() {
        let err = DriverError::unsupported_operation("whereColumn");
        assert_eq!(
            err.to_string(),
            "This database engine does not support the [whereColumn] operation."
        );
        assert_eq!(err.code(), None);

        let remote = DriverError::Remote {
            message: "boom".to_string(),
            status: Some(500),
            source: ApiError::transport("boom"),
        };
        assert_eq!(remote.code(), Some(500));
        assert_eq!(remote.kind(), "remote");
    }
}
