use serde_json::{Value as JsonValue, json};

use crate::adapter::Adapter;
use crate::core::Result;
use crate::executor::command::{Arguments, Command, Statement};
use crate::parser::{Blueprint, ColumnDef};

/// Timestamp placeholder the content API expands when a row is created.
const CURRENT_TIMESTAMP: &str = "{datetime}";

/// `first_name` → `First Name`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Compiles schema blueprints into ordered command statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaGrammar;

impl SchemaGrammar {
    #[must_use]
    pub fn compile_table_exists(table: &str) -> Statement {
        Statement::new(Command::TableExists, table_arguments(table))
    }

    #[must_use]
    pub fn compile_column_listing(table: &str) -> Statement {
        Statement::new(Command::TableColumnsSelect, table_arguments(table))
    }

    /// Table creation followed by one column add per non-reserved column.
    pub fn compile_create(blueprint: &Blueprint, adapter: &dyn Adapter) -> Result<Vec<Statement>> {
        let mut arguments = table_arguments(&blueprint.table);
        arguments.insert("name".into(), json!(normalize_name(&blueprint.table)));

        if adapter.is_reserved_table(&blueprint.table) {
            let config = json!({
                "disableRevisions": { "type": "boolean", "value": true },
                "hide_structure_from_listing": { "type": "boolean", "value": true },
            });
            arguments.insert("config".into(), json!(serde_json::to_string(&config)?));
        }

        let mut statements = vec![Statement::new(Command::TableCreate, arguments)];
        statements.extend(Self::compile_add(blueprint, adapter)?);
        Ok(statements)
    }

    pub fn compile_add(blueprint: &Blueprint, adapter: &dyn Adapter) -> Result<Vec<Statement>> {
        let mut statements = Vec::with_capacity(blueprint.columns.len());
        for column in &blueprint.columns {
            if adapter.is_reserved_field(&column.name) {
                continue;
            }
            statements.push(Self::compile_column(&blueprint.table, column)?);
        }
        Ok(statements)
    }

    fn compile_column(table: &str, column: &ColumnDef) -> Result<Statement> {
        let mut arguments = table_arguments(table);
        arguments.insert("column".into(), json!(column.name));
        arguments.insert("name".into(), json!(normalize_name(&column.name)));
        arguments.insert(
            "type".into(),
            json!(column.data_type.as_deref().unwrap_or("text")),
        );

        let default = match (&column.default, column.use_current) {
            (Some(value), _) => Some(value.to_json()),
            (None, true) => Some(json!(CURRENT_TIMESTAMP)),
            (None, false) => None,
        };
        if let Some(value) = default {
            let config = json!({ "default_value": { "type": "textField", "value": value } });
            arguments.insert("config".into(), json!(serde_json::to_string(&config)?));
        }

        Ok(Statement::new(Command::TableColumnAdd, arguments))
    }

    /// Nothing is compiled when either side is a reserved field.
    #[must_use]
    pub fn compile_rename_column(
        table: &str,
        from: &str,
        to: &str,
        adapter: &dyn Adapter,
    ) -> Vec<Statement> {
        if adapter.is_reserved_field(from) || adapter.is_reserved_field(to) {
            return Vec::new();
        }
        let mut arguments = table_arguments(table);
        arguments.insert("name".into(), json!(normalize_name(to)));
        arguments.insert("from".into(), json!(from));
        arguments.insert("to".into(), json!(to));
        vec![Statement::new(Command::TableColumnAlter, arguments)]
    }

    #[must_use]
    pub fn compile_drop_column<S: AsRef<str>>(
        table: &str,
        columns: &[S],
        adapter: &dyn Adapter,
    ) -> Vec<Statement> {
        columns
            .iter()
            .map(AsRef::as_ref)
            .filter(|column| !adapter.is_reserved_field(column))
            .map(|column| {
                let mut arguments = table_arguments(table);
                arguments.insert("column".into(), json!(column));
                Statement::new(Command::TableColumnDropIfExists, arguments)
            })
            .collect()
    }

    /// Drop that fails when the column is missing; `None` for reserved fields.
    #[must_use]
    pub fn compile_drop_column_strict(
        table: &str,
        column: &str,
        adapter: &dyn Adapter,
    ) -> Option<Statement> {
        if adapter.is_reserved_field(column) {
            return None;
        }
        let mut arguments = table_arguments(table);
        arguments.insert("column".into(), json!(column));
        Some(Statement::new(Command::TableColumnDrop, arguments))
    }

    #[must_use]
    pub fn compile_drop(table: &str) -> Statement {
        Statement::new(Command::TableDrop, table_arguments(table))
    }

    #[must_use]
    pub fn compile_drop_if_exists(table: &str) -> Statement {
        Statement::new(Command::TableDropIfExists, table_arguments(table))
    }
}

fn table_arguments(table: &str) -> Arguments {
    let mut arguments = Arguments::new();
    arguments.insert("table".into(), JsonValue::String(table.to_string()));
    arguments
}
