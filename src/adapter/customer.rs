use serde_json::Value as JsonValue;
use tracing::warn;

use super::errors::translate;
use super::{Adapter, ExecContext, path_id, payload, required};
use crate::core::{ColumnInfo, FieldType, ReservedField, Result};
use crate::executor::command::Arguments;

const RESOURCE: &str = "customer";
const CUSTOMER_PATH: &str = "relations/customers/customer";

const RESERVED_FIELDS: &[ReservedField] = &[
    ReservedField::new("id", FieldType::Integer, "Primary key").autoincrement(),
    ReservedField::new("extsync_id", FieldType::Integer, "External sync ID"),
    ReservedField::new("group_id", FieldType::Integer, "Group ID"),
    ReservedField::new("firstname", FieldType::String, "First name"),
    ReservedField::new("surname", FieldType::String, "Surname"),
    ReservedField::new("company", FieldType::String, "Company"),
    ReservedField::new("companyId", FieldType::String, "Company ID"),
    ReservedField::new("mail", FieldType::String, "E-mail").not_null(),
    ReservedField::new("phone", FieldType::String, "Phone"),
    ReservedField::new("phone_countrycode", FieldType::String, "Phone country code"),
    ReservedField::new("username", FieldType::String, "Username"),
    ReservedField::new("tags", FieldType::Array, "Tags"),
    ReservedField::new("created", FieldType::Datetime, "Created"),
    ReservedField::new("updated", FieldType::Datetime, "Updated"),
    ReservedField::new("user_hash", FieldType::String, "User hash"),
    ReservedField::new("no_newsletter", FieldType::Boolean, "Newsletters"),
    ReservedField::new("no_sms", FieldType::Boolean, "SMS"),
    ReservedField::new("score", FieldType::Integer, "Score"),
    ReservedField::new("token", FieldType::String, "Token"),
];

/// Customers of the relations API. The table always exists and can be
/// neither created nor dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerAdapter;

impl Adapter for CustomerAdapter {
    fn name(&self) -> &'static str {
        "customer"
    }

    fn reserved_table_names(&self) -> &'static [&'static str] {
        &[RESOURCE]
    }

    fn reserved_fields(&self) -> &'static [ReservedField] {
        RESERVED_FIELDS
    }

    fn insert(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        cx.set_last_insert_id(None);
        let response = cx
            .client()
            .post(CUSTOMER_PATH, &JsonValue::Object(payload(args)))
            .map_err(|err| translate(err, Some(RESOURCE)))?;
        cx.set_last_insert_id(response.get("customer_id").cloned());
        cx.set_affected_rows(1);
        Ok(true)
    }

    fn update(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let id = path_id(required(args, "id")?);
        cx.client()
            .put(&format!("{CUSTOMER_PATH}/{id}"), &JsonValue::Object(payload(args)))
            .map_err(|err| translate(err, Some(RESOURCE)))?;
        cx.set_affected_rows(1);
        Ok(true)
    }

    fn delete(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let id = path_id(required(args, "id")?);
        cx.client()
            .delete(&format!("{CUSTOMER_PATH}/{id}"))
            .map_err(|err| translate(err, Some(RESOURCE)))?;
        cx.set_affected_rows(1);
        Ok(true)
    }

    fn drop_table(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        Ok(false)
    }

    fn select_columns(&self, cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        let fields = match cx.client().get("relations/customers/fields") {
            Ok(JsonValue::Array(fields)) => fields,
            Ok(_) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to list customer fields");
                return Ok(false);
            }
        };

        cx.emit_all(
            RESERVED_FIELDS
                .iter()
                .map(ColumnInfo::from_reserved)
                .chain(fields.iter().map(ColumnInfo::from_remote_field))
                .map(|column| column.to_row()),
        );
        Ok(true)
    }
}
