use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use super::data_type::FieldType;
use super::row::Row;

/// Built-in column of a resource; protected from user DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedField {
    pub name: &'static str,
    pub field_type: FieldType,
    pub not_null: bool,
    pub autoincrement: bool,
    pub comment: &'static str,
}

impl ReservedField {
    #[must_use]
    pub const fn new(name: &'static str, field_type: FieldType, comment: &'static str) -> Self {
        Self {
            name,
            field_type,
            not_null: false,
            autoincrement: false,
            comment,
        }
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    #[must_use]
    pub const fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self.not_null = true;
        self
    }
}

/// One entry of a column listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub column: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub notnull: bool,
    pub autoincrement: bool,
    pub comment: Option<String>,
    /// Remote field id; absent for reserved columns.
    pub id: Option<JsonValue>,
}

impl ColumnInfo {
    #[must_use]
    pub fn from_reserved(field: &ReservedField) -> Self {
        Self {
            column: field.name.to_string(),
            name: field.name.to_string(),
            field_type: field.field_type.to_string(),
            notnull: field.not_null,
            autoincrement: field.autoincrement,
            comment: (!field.comment.is_empty()).then(|| field.comment.to_string()),
            id: None,
        }
    }

    /// Maps a field description returned by the structure/customer field APIs.
    #[must_use]
    pub fn from_remote_field(field: &JsonValue) -> Self {
        let text = |key: &str| field.get(key).and_then(JsonValue::as_str).map(str::to_string);
        let alias = text("alias").unwrap_or_default();

        Self {
            name: text("name").unwrap_or_else(|| alias.clone()),
            column: alias,
            field_type: text("type").unwrap_or_else(|| FieldType::Text.to_string()),
            notnull: field
                .get("notnull")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
            autoincrement: false,
            comment: text("description").filter(|c| !c.is_empty()),
            id: field.get("id").cloned(),
        }
    }

    #[must_use]
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("column".into(), json!(self.column));
        row.insert("name".into(), json!(self.name));
        row.insert("type".into(), json!(self.field_type));
        row.insert("notnull".into(), json!(self.notnull));
        row.insert("autoincrement".into(), json!(self.autoincrement));
        row.insert("comment".into(), json!(self.comment));
        row
    }
}

/// Looks up a reserved field by name.
#[must_use]
pub fn find_reserved<'a>(fields: &'a [ReservedField], name: &str) -> Option<&'a ReservedField> {
    fields.iter().find(|field| field.name == name)
}
