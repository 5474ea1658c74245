use tracing::info;

use super::command::Statement;
use crate::compiler::SchemaGrammar;
use crate::connection::Connection;
use crate::core::{ColumnInfo, DriverError, Result};
use crate::parser::Blueprint;

/// Schema operations on one connection. Table names may carry the
/// connection prefix; it is stripped before compiling.
#[derive(Debug, Clone, Copy)]
pub struct SchemaBuilder<'c> {
    connection: &'c Connection,
}

impl<'c> SchemaBuilder<'c> {
    pub(crate) const fn new(connection: &'c Connection) -> Self {
        Self { connection }
    }

    fn run_all(&self, statements: Vec<Statement>) -> Result<()> {
        for statement in statements {
            self.connection.prepare(statement).execute()?;
        }
        Ok(())
    }

    fn unprefixed(&self, blueprint: &Blueprint) -> Blueprint {
        let mut blueprint = blueprint.clone();
        blueprint.table = self.connection.table_name(&blueprint.table).to_string();
        blueprint
    }

    pub fn has_table(&self, table: &str) -> Result<bool> {
        let table = self.connection.table_name(table);
        self.connection
            .prepare(SchemaGrammar::compile_table_exists(table))
            .execute_probe()
    }

    pub fn create(&self, blueprint: &Blueprint) -> Result<()> {
        let blueprint = self.unprefixed(blueprint);
        info!(table = %blueprint.table, columns = blueprint.columns.len(), "create table");
        self.run_all(SchemaGrammar::compile_create(&blueprint, self.connection.adapter())?)
    }

    pub fn drop(&self, table: &str) -> Result<()> {
        let table = self.connection.table_name(table);
        info!(table, "drop table");
        self.run_all(vec![SchemaGrammar::compile_drop(table)])
    }

    pub fn drop_if_exists(&self, table: &str) -> Result<()> {
        let table = self.connection.table_name(table);
        self.run_all(vec![SchemaGrammar::compile_drop_if_exists(table)])
    }

    pub fn add_columns(&self, blueprint: &Blueprint) -> Result<()> {
        let blueprint = self.unprefixed(blueprint);
        self.run_all(SchemaGrammar::compile_add(&blueprint, self.connection.adapter())?)
    }

    pub fn rename_column(&self, table: &str, from: &str, to: &str) -> Result<()> {
        let table = self.connection.table_name(table);
        self.run_all(SchemaGrammar::compile_rename_column(
            table,
            from,
            to,
            self.connection.adapter(),
        ))
    }

    /// Drops each non-reserved column that exists.
    pub fn drop_columns<S: AsRef<str>>(&self, table: &str, columns: &[S]) -> Result<()> {
        let table = self.connection.table_name(table);
        self.run_all(SchemaGrammar::compile_drop_column(
            table,
            columns,
            self.connection.adapter(),
        ))
    }

    /// Drops a column that must exist.
    pub fn drop_column(&self, table: &str, column: &str) -> Result<()> {
        let table = self.connection.table_name(table);
        let statement =
            SchemaGrammar::compile_drop_column_strict(table, column, self.connection.adapter())
                .ok_or_else(|| {
                    DriverError::InvalidQuery(format!("column [{column}] is reserved"))
                })?;
        self.run_all(vec![statement])
    }

    pub fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let table = self.connection.table_name(table);
        let mut statement = self
            .connection
            .prepare(SchemaGrammar::compile_column_listing(table));
        statement.execute()?;
        statement
            .fetch_all()
            .into_iter()
            .map(|row| Ok(serde_json::from_value(serde_json::Value::Object(row))?))
            .collect()
    }

    /// Column names, in listing order.
    pub fn column_listing(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .columns(table)?
            .into_iter()
            .map(|column| column.column)
            .collect())
    }
}
