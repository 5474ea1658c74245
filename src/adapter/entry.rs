//! Generic entries of user-defined structures (`builder/structures/...`).

use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, warn};

use super::defaults::{fill_entry_defaults, fill_revision_defaults};
use super::errors::translate;
use super::{Adapter, ExecContext, path_id, payload, required, required_str};
use crate::core::{ColumnInfo, FieldType, ReservedField, Result};
use crate::executor::command::Arguments;

const RESERVED_FIELDS: &[ReservedField] = &[
    ReservedField::new("id", FieldType::Integer, "Primary key").autoincrement(),
    ReservedField::new("name", FieldType::String, "Name").not_null(),
    ReservedField::new("directory_id", FieldType::Integer, "Directory ID").not_null(),
    ReservedField::new("revision", FieldType::Integer, "Revision"),
    ReservedField::new("published", FieldType::Boolean, "Published"),
    ReservedField::new("userid", FieldType::Integer, "User ID"),
    ReservedField::new("use_time", FieldType::Boolean, "Use time"),
    ReservedField::new("start", FieldType::Datetime, "Start"),
    ReservedField::new("stop", FieldType::Datetime, "Stop"),
    ReservedField::new("public", FieldType::Boolean, "Public"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct EntryAdapter;

impl EntryAdapter {
    fn fields(cx: &ExecContext<'_>, table: &str) -> Result<Vec<JsonValue>> {
        let fields = cx
            .client()
            .get(&format!("builder/structures/{table}/fields"))
            .map_err(|err| translate(err, Some(&format!("entry_{table}"))))?;
        Ok(match fields {
            JsonValue::Array(fields) => fields,
            _ => Vec::new(),
        })
    }

    /// First field whose alias matches.
    fn find_field(cx: &ExecContext<'_>, table: &str, alias: &str) -> Result<Option<JsonValue>> {
        Ok(Self::fields(cx, table)?
            .into_iter()
            .find(|field| field.get("alias").and_then(JsonValue::as_str) == Some(alias)))
    }
}

impl Adapter for EntryAdapter {
    fn name(&self) -> &'static str {
        "entry"
    }

    fn reserved_fields(&self) -> &'static [ReservedField] {
        RESERVED_FIELDS
    }

    fn default_prefix(&self) -> &'static str {
        "entry_"
    }

    fn insert(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let table = required_str(args, "table")?;
        let mut data = payload(args);
        fill_entry_defaults(&mut data);

        cx.set_last_insert_id(None);
        let response = cx
            .client()
            .post(&format!("builder/structures/{table}/entry"), &JsonValue::Object(data))
            .map_err(|err| translate(err, Some(&format!("entry_{table}"))))?;
        cx.set_last_insert_id(response.get("entry_id").cloned());
        cx.set_affected_rows(1);
        Ok(true)
    }

    fn update(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let id = path_id(required(args, "id")?);
        let mut data = payload(args);
        fill_revision_defaults(&mut data);

        cx.client()
            .put(&format!("builder/structures/entry/{id}"), &JsonValue::Object(data))
            .map_err(|err| translate(err, None))?;
        cx.set_affected_rows(1);
        Ok(true)
    }

    fn delete(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let id = path_id(required(args, "id")?);
        cx.client()
            .delete(&format!("builder/structures/entry/{id}"))
            .map_err(|err| translate(err, None))?;
        cx.set_affected_rows(1);
        Ok(true)
    }

    fn table_exists(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let table = required_str(args, "table")?;
        match cx.client().get(&format!("builder/structures/{table}")) {
            Ok(structure) => Ok(structure.get("id").is_some_and(|id| !id.is_null())),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(translate(err, Some(&format!("entry_{table}")))),
        }
    }

    fn create_table(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        if self.table_exists(cx, args)? {
            debug!(table = ?args.get("table"), "structure already exists");
            return Ok(true);
        }

        let mut structure = args.clone();
        if let Some(table) = structure.remove("table") {
            info!("Creating search index for structure [{}]...", path_id(&table));
            structure.insert("alias".into(), table);
        }
        cx.client()
            .post("builder/structures", &JsonValue::Object(structure))
            .map_err(|err| translate(err, None))?;
        Ok(true)
    }

    fn drop_table(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let table = required_str(args, "table")?;
        match cx.client().delete(&format!("builder/structures/{table}")) {
            Ok(_) => Ok(true),
            Err(err) => {
                warn!(table, error = %err, "failed to drop structure");
                Ok(false)
            }
        }
    }

    fn drop_table_if_exists(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        if self.table_exists(cx, args)? {
            return self.drop_table(cx, args);
        }
        Ok(true)
    }

    fn select_columns(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let table = required_str(args, "table")?;
        let fields = match Self::fields(cx, table) {
            Ok(fields) => fields,
            Err(err) => {
                warn!(table, error = %err, "failed to list structure fields");
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

    fn column_exists(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let table = required_str(args, "table")?;
        let column = required_str(args, "column")?;
        Ok(Self::find_field(cx, table, column)?.is_some())
    }

    fn add_column(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        if self.column_exists(cx, args)? {
            return Ok(true);
        }

        let mut field = args.clone();
        let table = required_str(args, "table")?;
        field.remove("table");
        if let Some(column) = field.remove("column") {
            field.insert("alias".into(), column);
        }
        info!(table, field = ?field.get("alias"), "adding structure field");
        cx.client()
            .post(&format!("builder/structures/{table}/field"), &JsonValue::Object(field))
            .map_err(|err| translate(err, Some(&format!("entry_{table}"))))?;
        Ok(true)
    }

    fn alter_column(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let table = required_str(args, "table")?;
        let Some(field) = Self::find_field(cx, table, required_str(args, "from")?)? else {
            return Ok(false);
        };
        let Some(id) = field.get("id").filter(|id| !id.is_null()) else {
            return Ok(false);
        };

        cx.client()
            .put(
                &format!("builder/structures/field/{}", path_id(id)),
                &json!({ "name": args.get("name"), "alias": args.get("to") }),
            )
            .map_err(|err| translate(err, None))?;
        Ok(true)
    }

    fn drop_column(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let table = required_str(args, "table")?;
        let Some(field) = Self::find_field(cx, table, required_str(args, "column")?)? else {
            return Ok(false);
        };
        let Some(id) = field.get("id").filter(|id| !id.is_null()) else {
            return Ok(false);
        };

        cx.client()
            .delete(&format!("builder/structures/field/{}", path_id(id)))
            .map_err(|err| translate(err, None))?;
        Ok(true)
    }

    fn drop_column_if_exists(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        if self.column_exists(cx, args)? {
            return self.drop_column(cx, args);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments;
    use crate::client::{ApiError, Method, ScriptedClient};
    use crate::core::DriverError;
    use std::cell::RefCell;

    fn run<F>(client: &ScriptedClient, f: F) -> (Result<bool>, Option<JsonValue>)
    where
        F: FnOnce(&mut ExecContext<'_>) -> Result<bool>,
    {
        let slot = RefCell::new(Some(json!("stale")));
        let mut cx = ExecContext::new(client, &slot);
        let outcome = f(&mut cx);
        (outcome, slot.into_inner())
    }

    #[test]
    fn test_insert_fills_defaults_and_captures_id() {
        let client = ScriptedClient::new();
        client.respond(Method::Post, "builder/structures/news/entry", json!({ "entry_id": 10001 }));

        let args = arguments! { "table" => "news", "payload" => serde_json::json!({ "title": "Hello" }) };
        let (outcome, last_id) = run(&client, |cx| EntryAdapter.insert(cx, &args));
        assert!(outcome.unwrap());
        assert_eq!(last_id, Some(json!(10001)));

        let sent = client.requests_to(Method::Post, "builder/structures/news/entry");
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["title"], json!("Hello"));
        assert_eq!(body["revision_publish"], json!(true));
        assert!(body["name"].is_string());
    }

    #[test]
    fn test_failed_insert_clears_last_id() {
        let client = ScriptedClient::new();
        client.fail(
            Method::Post,
            "builder/structures/news/entry",
            ApiError::client(400, json!({ "error": { "message": "Invalid payload" } })),
        );
        let args = arguments! { "table" => "news", "payload" => {} };
        let (outcome, last_id) = run(&client, |cx| EntryAdapter.insert(cx, &args));
        let err = outcome.unwrap_err();
        assert_eq!(err.to_string(), "Invalid payload (Table: entry_news)");
        assert_eq!(last_id, None);
    }

    #[test]
    fn test_table_exists_maps_not_found() {
        let client = ScriptedClient::new();
        client.fail(Method::Get, "builder/structures/missing", ApiError::not_found());
        client.respond(Method::Get, "builder/structures/news", json!({ "id": 4, "alias": "news" }));
        client.fail(
            Method::Get,
            "builder/structures/broken",
            ApiError::client(403, json!({ "error": { "message": "Forbidden" } })),
        );

        let probe = |table: &str| {
            let args = arguments! { "table" => table };
            run(&client, |cx| EntryAdapter.table_exists(cx, &args)).0
        };
        assert!(!probe("missing").unwrap());
        assert!(probe("news").unwrap());
        assert!(matches!(probe("broken"), Err(DriverError::Remote { status: Some(403), .. })));
    }

    #[test]
    fn test_create_table_is_idempotent() {
        let client = ScriptedClient::new();
        client.respond(Method::Get, "builder/structures/news", json!({ "id": 4 }));
        let args = arguments! { "table" => "news", "name" => "News" };
        assert!(run(&client, |cx| EntryAdapter.create_table(cx, &args)).0.unwrap());
        assert!(client.requests_to(Method::Post, "builder/structures").is_empty());

        let fresh = ScriptedClient::new();
        fresh.fail(Method::Get, "builder/structures/news", ApiError::not_found());
        assert!(run(&fresh, |cx| EntryAdapter.create_table(cx, &args)).0.unwrap());
        let created = fresh.requests_to(Method::Post, "builder/structures");
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].body, Some(json!({ "alias": "news", "name": "News" })));
    }

    #[test]
    fn test_drop_table_failure_is_false() {
        let client = ScriptedClient::new();
        client.fail(Method::Delete, "builder/structures/news", ApiError::server(500, json!({})));
        let args = arguments! { "table" => "news" };
        assert!(!run(&client, |cx| EntryAdapter.drop_table(cx, &args)).0.unwrap());
    }

    #[test]
    fn test_select_columns_lists_reserved_then_remote() {
        let client = ScriptedClient::new();
        client.respond(
            Method::Get,
            "builder/structures/news/fields",
            json!([{ "id": 31, "alias": "lead", "name": "Lead", "type": "editor-small" }]),
        );
        let slot = RefCell::new(None);
        let mut cx = ExecContext::new(&client, &slot);
        assert!(EntryAdapter.select_columns(&mut cx, &arguments! { "table" => "news" }).unwrap());
        let (rows, _) = cx.finish();
        assert_eq!(rows.len(), RESERVED_FIELDS.len() + 1);
        assert_eq!(rows[0]["column"], json!("id"));
        assert_eq!(rows.last().unwrap()["column"], json!("lead"));
        assert_eq!(rows.last().unwrap()["type"], json!("editor-small"));
    }

    #[test]
    fn test_add_column_renames_column_to_alias() {
        let client = ScriptedClient::new();
        client.respond(Method::Get, "builder/structures/news/fields", json!([]));
        let args = arguments! { "table" => "news", "column" => "lead", "name" => "Lead", "type" => "text" };
        assert!(run(&client, |cx| EntryAdapter.add_column(cx, &args)).0.unwrap());
        let posted = client.requests_to(Method::Post, "builder/structures/news/field");
        assert_eq!(
            posted[0].body,
            Some(json!({ "alias": "lead", "name": "Lead", "type": "text" }))
        );
    }

    #[test]
    fn test_alter_and_drop_use_first_alias_match() {
        let client = ScriptedClient::new();
        client.respond(
            Method::Get,
            "builder/structures/news/fields",
            json!([
                { "id": 7, "alias": "lead" },
                { "id": 8, "alias": "lead" }
            ]),
        );

        let rename = arguments! { "table" => "news", "from" => "lead", "to" => "intro", "name" => "Intro" };
        assert!(run(&client, |cx| EntryAdapter.alter_column(cx, &rename)).0.unwrap());
        let put = client.requests_to(Method::Put, "builder/structures/field/7");
        assert_eq!(put[0].body, Some(json!({ "name": "Intro", "alias": "intro" })));

        let drop = arguments! { "table" => "news", "column" => "lead" };
        assert!(run(&client, |cx| EntryAdapter.drop_column(cx, &drop)).0.unwrap());
        assert_eq!(client.requests_to(Method::Delete, "builder/structures/field/7").len(), 1);

        let missing = arguments! { "table" => "news", "column" => "nope" };
        assert!(!run(&client, |cx| EntryAdapter.drop_column(cx, &missing)).0.unwrap());
        assert!(run(&client, |cx| EntryAdapter.drop_column_if_exists(cx, &missing)).0.unwrap());
    }
}
