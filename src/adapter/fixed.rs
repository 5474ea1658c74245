//! Read-only resources bound to one fixed index.

use std::borrow::Cow;

use super::Adapter;
use crate::core::{FieldType, ReservedField};

const PRIMARY_KEY: ReservedField =
    ReservedField::new("id", FieldType::Integer, "Primary key").autoincrement();

const fn required(name: &'static str, field_type: FieldType, comment: &'static str) -> ReservedField {
    ReservedField::new(name, field_type, comment).not_null()
}

const FILE_FIELDS: &[ReservedField] = &[
    PRIMARY_KEY,
    required("folder_id", FieldType::Integer, "Folder ID"),
    required("name", FieldType::String, "File name"),
    required("path", FieldType::String, "File path"),
    required("description", FieldType::String, "File description"),
    required("tags", FieldType::Array, "File tags"),
    required("size", FieldType::Integer, "File size"),
    required("type", FieldType::String, "File type"),
    required("created", FieldType::Datetime, "File creation date"),
    required("userid", FieldType::Integer, "User ID"),
    required("public", FieldType::Boolean, "Public"),
    required("related_entries", FieldType::Array, "Related entries"),
    required("related_customers", FieldType::Array, "Related customers"),
    required("img_width", FieldType::Integer, "Image width"),
    required("img_height", FieldType::Integer, "Image height"),
    required("img_res", FieldType::String, "Image resolution"),
    required("img_lat", FieldType::String, "Image latitude"),
    required("img_lon", FieldType::String, "Image longitude"),
    required("img_artist", FieldType::String, "Image artist"),
    required("img_desc", FieldType::String, "Image description"),
    required("img_alt", FieldType::String, "Image alt text"),
    required("img_o_date", FieldType::Datetime, "Image original date"),
    required("foldercode", FieldType::String, "Folder code"),
];

const ORDER_FIELDS: &[ReservedField] = &[
    PRIMARY_KEY,
    required("secret", FieldType::String, "Secret key"),
];

const ID_ONLY: &[ReservedField] = &[PRIMARY_KEY];

/// A resource that maps every table name onto one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTableAdapter {
    resource: &'static [&'static str; 1],
    fields: &'static [ReservedField],
}

impl FixedTableAdapter {
    pub const FILE: Self = Self::new(&["file"], FILE_FIELDS);
    pub const ORDER: Self = Self::new(&["order"], ORDER_FIELDS);
    pub const NEWSLETTER: Self = Self::new(&["newsletter"], ID_ONLY);
    pub const SIGNUP: Self = Self::new(&["signup"], ID_ONLY);

    #[must_use]
    pub const fn new(resource: &'static [&'static str; 1], fields: &'static [ReservedField]) -> Self {
        Self { resource, fields }
    }

    #[must_use]
    pub const fn resource(&self) -> &'static str {
        self.resource[0]
    }
}

impl Adapter for FixedTableAdapter {
    fn name(&self) -> &'static str {
        self.resource()
    }

    fn reserved_table_names(&self) -> &'static [&'static str] {
        self.resource
    }

    fn reserved_fields(&self) -> &'static [ReservedField] {
        self.fields
    }

    fn table_name<'t>(&self, _table: &'t str) -> Cow<'t, str> {
        Cow::Borrowed(self.resource())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resources_are_fixed() {
        assert_eq!(FixedTableAdapter::FILE.table_name("anything"), "file");
        assert_eq!(FixedTableAdapter::ORDER.table_name("orders"), "order");
        assert!(FixedTableAdapter::NEWSLETTER.is_reserved_table("newsletter"));
        assert_eq!(FixedTableAdapter::SIGNUP.name(), "signup");
    }

    #[test]
    fn test_reserved_fields() {
        assert!(FixedTableAdapter::ORDER.is_reserved_field("secret"));
        assert!(!FixedTableAdapter::SIGNUP.is_reserved_field("secret"));
        let size = FILE_FIELDS.iter().find(|f| f.name == "size").unwrap();
        assert!(size.not_null);
        assert_eq!(size.field_type, FieldType::Integer);
    }
}
