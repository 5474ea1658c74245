//! Resource adapters.
//!
//! Every command the executor dispatches ends up in one [`Adapter`] method.
//! The trait's default bodies describe a read-only resource: selects run
//! the shared search, schema probes succeed, and mutations are refused.
//! Concrete adapters override what their resource supports.

pub mod customer;
pub mod defaults;
pub mod entry;
pub mod errors;
pub mod fixed;
pub mod page;
pub mod read_only;
pub mod registry;
pub mod search;

use std::borrow::Cow;
use std::cell::RefCell;

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::core::column::find_reserved;
use crate::core::{ColumnInfo, DriverError, ReservedField, Result, Row};
use crate::executor::command::{Arguments, Command};

pub use customer::CustomerAdapter;
pub use entry::EntryAdapter;
pub use fixed::FixedTableAdapter;
pub use page::PageAdapter;
pub use read_only::ReadOnlyAdapter;
pub use registry::AdapterRegistry;

/// Execution state handed to an adapter method: the API client, the
/// connection's last-insert-id slot, and the rows the statement will yield.
pub struct ExecContext<'a> {
    client: &'a dyn ApiClient,
    last_insert_id: &'a RefCell<Option<JsonValue>>,
    rows: Vec<Row>,
    affected_rows: u64,
}

impl<'a> ExecContext<'a> {
    pub fn new(client: &'a dyn ApiClient, last_insert_id: &'a RefCell<Option<JsonValue>>) -> Self {
        Self {
            client,
            last_insert_id,
            rows: Vec::new(),
            affected_rows: 0,
        }
    }

    #[must_use]
    pub fn client(&self) -> &'a dyn ApiClient {
        self.client
    }

    pub fn set_last_insert_id(&self, id: Option<JsonValue>) {
        *self.last_insert_id.borrow_mut() = id;
    }

    pub fn emit(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn emit_all(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.rows.extend(rows);
    }

    pub fn set_affected_rows(&mut self, affected_rows: u64) {
        self.affected_rows = affected_rows;
    }

    /// Rows and affected-row count produced so far.
    #[must_use]
    pub fn finish(self) -> (Vec<Row>, u64) {
        (self.rows, self.affected_rows)
    }
}

/// String argument that must be present.
pub fn required_str<'a>(arguments: &'a Arguments, key: &str) -> Result<&'a str> {
    arguments
        .get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| DriverError::InvalidQuery(format!("missing argument [{key}]")))
}

/// Argument that must be present and not null.
pub fn required<'a>(arguments: &'a Arguments, key: &str) -> Result<&'a JsonValue> {
    arguments
        .get(key)
        .filter(|value| !value.is_null())
        .ok_or_else(|| DriverError::InvalidQuery(format!("missing argument [{key}]")))
}

/// Id rendered for a resource path: strings as-is, numbers without quotes.
#[must_use]
pub fn path_id(id: &JsonValue) -> String {
    match id {
        JsonValue::String(id) => id.clone(),
        other => other.to_string(),
    }
}

/// `payload` argument as an object; absent means empty.
#[must_use]
pub fn payload(arguments: &Arguments) -> Row {
    arguments
        .get("payload")
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default()
}

fn refuse(adapter: &str, command: Command) -> Result<bool> {
    warn!(adapter, %command, "command not supported by this resource");
    Ok(false)
}

pub trait Adapter: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn reserved_table_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn reserved_fields(&self) -> &'static [ReservedField] {
        &[]
    }

    fn is_reserved_field(&self, column: &str) -> bool {
        find_reserved(self.reserved_fields(), column).is_some()
    }

    fn is_reserved_table(&self, table: &str) -> bool {
        self.reserved_table_names().contains(&table)
    }

    /// Remote resource a table name maps to.
    fn table_name<'t>(&self, table: &'t str) -> Cow<'t, str> {
        Cow::Borrowed(table)
    }

    /// Table prefix used when the connection does not configure one.
    fn default_prefix(&self) -> &'static str {
        ""
    }

    fn select(&self, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        let table = self.table_name(required_str(args, "table")?).into_owned();
        search::perform_select(cx, &table, args)
    }

    fn insert(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::Insert)
    }

    fn update(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::Update)
    }

    fn delete(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::Delete)
    }

    fn table_exists(&self, _cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        debug!(adapter = self.name(), table = ?args.get("table"), "built-in table exists");
        Ok(true)
    }

    fn create_table(&self, _cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        info!(adapter = self.name(), table = ?args.get("table"), "built-in table, nothing to create");
        Ok(true)
    }

    fn drop_table(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::TableDrop)
    }

    fn drop_table_if_exists(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::TableDropIfExists)
    }

    fn select_columns(&self, cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        cx.emit_all(
            self.reserved_fields()
                .iter()
                .map(|field| ColumnInfo::from_reserved(field).to_row()),
        );
        Ok(true)
    }

    fn column_exists(&self, _cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
        Ok(self.is_reserved_field(required_str(args, "column")?))
    }

    fn add_column(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::TableColumnAdd)
    }

    fn alter_column(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::TableColumnAlter)
    }

    fn drop_column(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::TableColumnDrop)
    }

    fn drop_column_if_exists(&self, _cx: &mut ExecContext<'_>, _args: &Arguments) -> Result<bool> {
        refuse(self.name(), Command::TableColumnDropIfExists)
    }
}
