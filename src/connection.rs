//! A configured connection: one API client, one resolved adapter, and the
//! table prefix shared by every statement it prepares.

use std::cell::RefCell;
use std::slice;
use std::sync::Arc;

use serde_json::{Value as JsonValue, json};
use tracing::{debug, info};

use crate::adapter::{Adapter, AdapterRegistry};
use crate::client::{ApiClient, HttpClient, ScriptedClient};
use crate::compiler::{MutationTarget, QueryGrammar, SchemaGrammar};
use crate::config::ConnectionConfig;
use crate::core::{DriverError, Result, Row, Value};
use crate::executor::bulk::{compile_id_search, perform_bulk_action};
use crate::executor::{Command, PreparedStatement, QueryResult, SchemaBuilder, Statement};
use crate::parser::{AggregateFunction, AlterTableOperation, Blueprint, Query, SqlStatement};

#[derive(Debug)]
pub struct Connection {
    name: String,
    prefix: String,
    client: Arc<dyn ApiClient>,
    adapter: Arc<dyn Adapter>,
    last_insert_id: RefCell<Option<JsonValue>>,
}

impl Connection {
    pub fn new(
        config: &ConnectionConfig,
        client: Arc<dyn ApiClient>,
        registry: &AdapterRegistry,
    ) -> Result<Self> {
        let adapter = registry.resolve(&config.adapter, config)?;
        let prefix = config
            .prefix
            .clone()
            .unwrap_or_else(|| adapter.default_prefix().to_string());
        debug!(connection = %config.name, adapter = adapter.name(), prefix, "connection ready");

        Ok(Self {
            name: config.name.clone(),
            prefix,
            client,
            adapter,
            last_insert_id: RefCell::new(None),
        })
    }

    /// Connects over HTTP.
    pub fn connect(config: &ConnectionConfig, registry: &AdapterRegistry) -> Result<Self> {
        let client = HttpClient::new(config)?;
        info!(connection = %config.name, base_url = %config.base_url, "connecting");
        Self::new(config, Arc::new(client), registry)
    }

    /// Connects to an in-memory client that records requests instead of
    /// sending them.
    pub fn pretend(
        config: &ConnectionConfig,
        registry: &AdapterRegistry,
    ) -> Result<(Self, Arc<ScriptedClient>)> {
        let scripted = Arc::new(ScriptedClient::new());
        let client: Arc<dyn ApiClient> = scripted.clone();
        Ok((Self::new(config, client, registry)?, scripted))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub(crate) fn client(&self) -> &dyn ApiClient {
        self.client.as_ref()
    }

    pub(crate) fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    pub(crate) const fn last_insert_id_slot(&self) -> &RefCell<Option<JsonValue>> {
        &self.last_insert_id
    }

    /// Id captured by the last insert; reset before every insert attempt.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<JsonValue> {
        self.last_insert_id.borrow().clone()
    }

    /// Search index for a table: the prefix is added when missing.
    #[must_use]
    pub fn index_name(&self, table: &str) -> String {
        if table.starts_with(&self.prefix) {
            table.to_string()
        } else {
            format!("{}{table}", self.prefix)
        }
    }

    /// Resource name for a table: the prefix is removed.
    #[must_use]
    pub fn table_name<'t>(&self, table: &'t str) -> &'t str {
        if self.prefix.is_empty() {
            return table;
        }
        table.strip_prefix(self.prefix.as_str()).unwrap_or(table)
    }

    /// Compiles against the caller's table so qualifiers strip; only the
    /// request's target index carries the prefix.
    fn compile_select(&self, query: &Query) -> Result<Statement> {
        let mut request = QueryGrammar::compile_search_request(query)?;
        request.insert("table".to_string(), json!(self.index_name(&query.table)));
        Ok(Statement::new(Command::Search, request))
    }

    #[must_use]
    pub fn prepare(&self, statement: Statement) -> PreparedStatement<'_> {
        PreparedStatement::new(self, statement)
    }

    #[must_use]
    pub const fn schema(&self) -> SchemaBuilder<'_> {
        SchemaBuilder::new(self)
    }

    pub fn select(&self, query: &Query) -> Result<Vec<Row>> {
        let mut statement = self.prepare(self.compile_select(query)?);
        statement.execute()?;
        Ok(statement.fetch_all())
    }

    /// Value of the query's aggregate, `None` when the response has none.
    pub fn aggregate(&self, query: &Query) -> Result<Option<JsonValue>> {
        Ok(self
            .select(query)?
            .pop()
            .and_then(|mut row| row.remove("aggregate")))
    }

    pub fn count(&self, query: &Query) -> Result<u64> {
        let query = query.clone().aggregate(AggregateFunction::Count, ["*"]);
        Ok(self
            .aggregate(&query)?
            .and_then(|value| value.as_u64().or_else(|| value.as_f64().map(|v| v as u64)))
            .unwrap_or(0))
    }

    /// One insert per row; returns the number of rows inserted.
    pub fn insert(&self, table: &str, rows: &[Row]) -> Result<u64> {
        let table = self.table_name(table);
        let mut inserted = 0;
        for row in rows {
            let mut statement = self.prepare(QueryGrammar::compile_insert(table, row));
            statement.execute()?;
            inserted += statement.affected_rows();
        }
        Ok(inserted)
    }

    pub fn insert_get_id(&self, table: &str, row: &Row) -> Result<Option<JsonValue>> {
        self.insert(table, slice::from_ref(row))?;
        Ok(self.last_insert_id())
    }

    pub fn update(&self, query: &Query, values: &Row) -> Result<u64> {
        let table = self.table_name(&query.table);
        match QueryGrammar::compile_target(query)? {
            MutationTarget::Id(id) => {
                let mut statement = self.prepare(QueryGrammar::compile_update(table, &id, values));
                statement.execute()?;
                Ok(statement.affected_rows())
            }
            MutationTarget::Matching(clause) => {
                perform_bulk_action(self, &self.index_name(&query.table), clause, |id| {
                    self.prepare(QueryGrammar::compile_update(table, id, values))
                        .execute()
                })
            }
        }
    }

    pub fn delete(&self, query: &Query) -> Result<u64> {
        let table = self.table_name(&query.table);
        match QueryGrammar::compile_target(query)? {
            MutationTarget::Id(id) => {
                let mut statement = self.prepare(QueryGrammar::compile_delete(table, &id));
                statement.execute()?;
                Ok(statement.affected_rows())
            }
            MutationTarget::Matching(clause) => {
                perform_bulk_action(self, &self.index_name(&query.table), clause, |id| {
                    self.prepare(QueryGrammar::compile_delete(table, id)).execute()
                })
            }
        }
    }

    pub fn begin_transaction(&self) -> Result<()> {
        Err(DriverError::Unsupported("transactions".to_string()))
    }

    /// Statements a SQL statement compiles to, without running them.
    /// Updates and deletes without an id show their id search.
    pub fn explain(&self, statement: &SqlStatement) -> Result<Vec<Statement>> {
        let adapter = self.adapter();
        Ok(match statement {
            SqlStatement::Select(query) => {
                vec![self.compile_select(query)?]
            }
            SqlStatement::Insert { table, columns, rows } => {
                let resource = self.table_name(table);
                rows_from_values(columns, rows)?
                    .iter()
                    .map(|row| QueryGrammar::compile_insert(resource, row))
                    .collect()
            }
            SqlStatement::Update { query, assignments } => {
                let values = row_from_assignments(assignments);
                match QueryGrammar::compile_target(query)? {
                    MutationTarget::Id(id) => vec![QueryGrammar::compile_update(
                        self.table_name(&query.table),
                        &id,
                        &values,
                    )],
                    MutationTarget::Matching(clause) => {
                        vec![compile_id_search(&self.index_name(&query.table), clause)]
                    }
                }
            }
            SqlStatement::Delete { query } => match QueryGrammar::compile_target(query)? {
                MutationTarget::Id(id) => {
                    vec![QueryGrammar::compile_delete(self.table_name(&query.table), &id)]
                }
                MutationTarget::Matching(clause) => {
                    vec![compile_id_search(&self.index_name(&query.table), clause)]
                }
            },
            SqlStatement::CreateTable(blueprint) => {
                let mut blueprint = blueprint.clone();
                blueprint.table = self.table_name(&blueprint.table).to_string();
                SchemaGrammar::compile_create(&blueprint, adapter)?
            }
            SqlStatement::DropTable { name, if_exists } => {
                let table = self.table_name(name);
                if *if_exists {
                    vec![SchemaGrammar::compile_drop_if_exists(table)]
                } else {
                    vec![SchemaGrammar::compile_drop(table)]
                }
            }
            SqlStatement::AlterTable { name, operation } => {
                let table = self.table_name(name);
                match operation {
                    AlterTableOperation::AddColumn(column) => SchemaGrammar::compile_add(
                        &Blueprint::new(table).column(column.clone()),
                        adapter,
                    )?,
                    AlterTableOperation::RenameColumn { from, to } => {
                        SchemaGrammar::compile_rename_column(table, from, to, adapter)
                    }
                    AlterTableOperation::DropColumn { name, if_exists: true } => {
                        SchemaGrammar::compile_drop_column(table, slice::from_ref(name), adapter)
                    }
                    AlterTableOperation::DropColumn { name, if_exists: false } => {
                        SchemaGrammar::compile_drop_column_strict(table, name, adapter)
                            .into_iter()
                            .collect()
                    }
                }
            }
        })
    }

    /// Runs a parsed SQL statement.
    pub fn run(&self, statement: &SqlStatement) -> Result<QueryResult> {
        let schema = self.schema();
        match statement {
            SqlStatement::Select(query) => Ok(QueryResult::Rows(self.select(query)?)),
            SqlStatement::Insert { table, columns, rows } => Ok(QueryResult::Affected(
                self.insert(table, &rows_from_values(columns, rows)?)?,
            )),
            SqlStatement::Update { query, assignments } => Ok(QueryResult::Affected(
                self.update(query, &row_from_assignments(assignments))?,
            )),
            SqlStatement::Delete { query } => Ok(QueryResult::Affected(self.delete(query)?)),
            SqlStatement::CreateTable(blueprint) => {
                schema.create(blueprint)?;
                Ok(QueryResult::Success(format!("Table '{}' created", blueprint.table)))
            }
            SqlStatement::DropTable { name, if_exists } => {
                if *if_exists {
                    schema.drop_if_exists(name)?;
                } else {
                    schema.drop(name)?;
                }
                Ok(QueryResult::Success(format!("Table '{name}' dropped")))
            }
            SqlStatement::AlterTable { name, operation } => {
                match operation {
                    AlterTableOperation::AddColumn(column) => {
                        schema.add_columns(&Blueprint::new(name.clone()).column(column.clone()))?;
                    }
                    AlterTableOperation::RenameColumn { from, to } => {
                        schema.rename_column(name, from, to)?;
                    }
                    AlterTableOperation::DropColumn { name: column, if_exists: true } => {
                        schema.drop_columns(name, slice::from_ref(column))?;
                    }
                    AlterTableOperation::DropColumn { name: column, if_exists: false } => {
                        schema.drop_column(name, column)?;
                    }
                }
                Ok(QueryResult::Success(format!("Table '{name}' altered")))
            }
        }
    }
}

fn rows_from_values(columns: &[String], rows: &[Vec<Value>]) -> Result<Vec<Row>> {
    rows.iter()
        .map(|values| {
            if values.len() != columns.len() {
                return Err(DriverError::InvalidQuery(format!(
                    "{} columns but {} values",
                    columns.len(),
                    values.len()
                )));
            }
            Ok(columns
                .iter()
                .cloned()
                .zip(values.iter().map(Value::to_json))
                .collect())
        })
        .collect()
}

fn row_from_assignments(assignments: &[(String, Value)]) -> Row {
    assignments
        .iter()
        .map(|(column, value)| (column.clone(), value.to_json()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::parser::parse_statement;

    fn connection(adapter: &str) -> (Connection, Arc<ScriptedClient>) {
        let config = ConnectionConfig::new("test").with_adapter(adapter);
        Connection::pretend(&config, &AdapterRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_prefix_defaults_to_adapter() {
        let (entry, _) = connection("entry");
        assert_eq!(entry.prefix(), "entry_");
        assert_eq!(entry.index_name("news"), "entry_news");
        assert_eq!(entry.index_name("entry_news"), "entry_news");
        assert_eq!(entry.table_name("entry_news"), "news");
        assert_eq!(entry.table_name("news"), "news");

        let config = ConnectionConfig::new("test").with_adapter("entry").with_prefix("");
        let (bare, _) = Connection::pretend(&config, &AdapterRegistry::with_defaults()).unwrap();
        assert_eq!(bare.index_name("news"), "news");
    }

    #[test]
    fn test_update_by_id_skips_search() {
        let (connection, client) = connection("entry");
        let query = Query::table("entry_news").where_eq("id", 7);
        let values: Row = [("title".to_string(), json!("New"))].into_iter().collect();

        assert_eq!(connection.update(&query, &values).unwrap(), 1);
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].path, "builder/structures/entry/7");
        assert_eq!(requests[0].body.as_ref().unwrap()["title"], json!("New"));
    }

    #[test]
    fn test_multi_row_insert() {
        let (connection, client) = connection("entry");
        client.respond(Method::Post, "builder/structures/news/entry", json!({ "entry_id": 1 }));
        let row = |title: &str| -> Row { [("title".to_string(), json!(title))].into_iter().collect() };

        assert_eq!(connection.insert("entry_news", &[row("a"), row("b")]).unwrap(), 2);
        assert_eq!(client.requests_to(Method::Post, "builder/structures/news/entry").len(), 2);
        assert_eq!(connection.insert_get_id("news", &row("c")).unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_count_reads_aggregate() {
        let (connection, client) = connection("entry");
        client.respond(
            Method::Post,
            "search/raw",
            json!({ "hits": { "total": 42, "hits": [] }, "aggregations": { "aggregate": { "value": 42 } } }),
        );
        assert_eq!(connection.count(&Query::table("news")).unwrap(), 42);

        let sent = client.requests_to(Method::Post, "search/raw");
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["table"], json!("entry_news"));
        assert_eq!(body["size"], json!(0));
    }

    #[test]
    fn test_qualified_columns_strip_before_prefixing() {
        let (connection, client) = connection("entry");
        connection
            .select(&Query::table("news").where_eq("news.title", "x"))
            .unwrap();

        let statement = parse_statement("SELECT * FROM news WHERE news.title = 'x'").unwrap();
        let explained = connection.explain(&statement).unwrap();
        assert_eq!(explained[0].arguments()["table"], json!("entry_news"));

        let sent = client.requests_to(Method::Post, "search/raw");
        assert_eq!(sent.len(), 1);
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["table"], json!("entry_news"));
        assert_eq!(body["body"]["query"]["query_string"]["query"], json!("(title:\"x\")"));
        assert_eq!(
            explained[0].arguments()["body"]["query"]["query_string"]["query"],
            json!("(title:\"x\")")
        );
    }

    #[test]
    fn test_transactions_are_unsupported() {
        let (connection, _) = connection("default");
        let err = connection.begin_transaction().unwrap_err();
        assert_eq!(err.to_string(), "This database engine does not support transactions.");
    }

    #[test]
    fn test_explain_sends_nothing() {
        let (connection, client) = connection("entry");
        let statement = parse_statement("DELETE FROM news WHERE author = 'kim'").unwrap();
        let explained = connection.explain(&statement).unwrap();
        assert_eq!(explained.len(), 1);
        assert_eq!(explained[0].command(), Command::Search);
        assert_eq!(explained[0].arguments()["table"], json!("entry_news"));
        assert!(client.requests().is_empty());

        let insert = parse_statement("INSERT INTO news (title) VALUES ('a'), ('b')").unwrap();
        let explained = connection.explain(&insert).unwrap();
        assert_eq!(explained.len(), 2);
        assert_eq!(explained[1].arguments()["table"], json!("news"));
    }

    #[test]
    fn test_insert_arity_mismatch() {
        let (connection, _) = connection("entry");
        let statement = SqlStatement::Insert {
            table: "news".to_string(),
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![Value::Integer(1)]],
        };
        assert!(matches!(connection.run(&statement), Err(DriverError::InvalidQuery(_))));
    }
}
