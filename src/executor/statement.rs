use std::collections::VecDeque;

use serde_json::Value as JsonValue;

use super::command::Statement;
use super::dispatcher;
use crate::adapter::ExecContext;
use crate::connection::Connection;
use crate::core::{DriverError, Result, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    Created,
    Executing,
    Succeeded,
    Failed,
}

/// Error recorded by the last failed execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: &'static str,
    pub code: Option<u16>,
    pub message: String,
}

impl ErrorInfo {
    fn from_error(error: &DriverError) -> Self {
        Self {
            kind: error.kind(),
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// A statement bound to a connection. Results are buffered once and read
/// in a single pass.
#[derive(Debug)]
pub struct PreparedStatement<'c> {
    connection: &'c Connection,
    statement: Statement,
    state: StatementState,
    rows: VecDeque<Row>,
    affected_rows: u64,
    error_info: Option<ErrorInfo>,
}

impl<'c> PreparedStatement<'c> {
    pub(crate) fn new(connection: &'c Connection, statement: Statement) -> Self {
        Self {
            connection,
            statement,
            state: StatementState::Created,
            rows: VecDeque::new(),
            affected_rows: 0,
            error_info: None,
        }
    }

    #[must_use]
    pub const fn statement(&self) -> &Statement {
        &self.statement
    }

    #[must_use]
    pub const fn state(&self) -> StatementState {
        self.state
    }

    /// Executes the statement; an adapter reporting failure is an error.
    pub fn execute(&mut self) -> Result<()> {
        if self.run()? {
            return Ok(());
        }
        let error = DriverError::Statement {
            code: None,
            message: "Failed to execute statement".to_string(),
        };
        self.state = StatementState::Failed;
        self.error_info = Some(ErrorInfo::from_error(&error));
        Err(error)
    }

    /// Executes a yes/no command such as `table_exists`.
    pub fn execute_probe(&mut self) -> Result<bool> {
        self.run()
    }

    fn run(&mut self) -> Result<bool> {
        self.state = StatementState::Executing;
        self.rows.clear();
        self.affected_rows = 0;
        self.error_info = None;

        let connection = self.connection;
        let mut cx = ExecContext::new(connection.client(), connection.last_insert_id_slot());
        let outcome = dispatcher::dispatch(connection.adapter(), &mut cx, &self.statement);
        let (rows, affected_rows) = cx.finish();
        self.rows = rows.into();
        self.affected_rows = affected_rows;

        match outcome {
            Ok(done) => {
                self.state = StatementState::Succeeded;
                Ok(done)
            }
            Err(error) => {
                self.state = StatementState::Failed;
                self.error_info = Some(ErrorInfo::from_error(&error));
                Err(error)
            }
        }
    }

    pub fn fetch(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    pub fn fetch_all(&mut self) -> Vec<Row> {
        self.rows.drain(..).collect()
    }

    /// The `index`-th value of the next row.
    pub fn fetch_column(&mut self, index: usize) -> Option<JsonValue> {
        let row = self.fetch()?;
        row.into_iter().nth(index).map(|(_, value)| value)
    }

    #[must_use]
    pub const fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    #[must_use]
    pub fn error_code(&self) -> Option<u16> {
        self.error_info.as_ref().and_then(|info| info.code)
    }

    #[must_use]
    pub const fn error_info(&self) -> Option<&ErrorInfo> {
        self.error_info.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterRegistry;
    use crate::adapter::search::SEARCH_PATH;
    use crate::arguments;
    use crate::client::{ApiError, Method};
    use crate::config::ConnectionConfig;
    use crate::executor::command::Command;
    use serde_json::json;

    fn connection(adapter: &str) -> (Connection, std::sync::Arc<crate::client::ScriptedClient>) {
        let config = ConnectionConfig::new("test").with_adapter(adapter);
        Connection::pretend(&config, &AdapterRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_fetch_is_single_pass() {
        let (connection, client) = connection("entry");
        client.respond(
            Method::Post,
            SEARCH_PATH,
            json!({ "hits": { "total": 2, "hits": [
                { "_source": { "id": 1, "title": "a" } },
                { "_source": { "id": 2, "title": "b" } }
            ] } }),
        );

        let mut statement = connection.prepare(Statement::new(
            Command::Search,
            arguments! { "table" => "entry_news" },
        ));
        assert_eq!(statement.state(), StatementState::Created);
        statement.execute().unwrap();
        assert_eq!(statement.state(), StatementState::Succeeded);
        assert_eq!(statement.affected_rows(), 2);

        assert_eq!(statement.fetch_column(1), Some(json!("a")));
        assert_eq!(statement.fetch_all().len(), 1);
        assert!(statement.fetch().is_none());
        assert!(statement.fetch_all().is_empty());
    }

    #[test]
    fn test_false_outcome_is_statement_error() {
        let (connection, _client) = connection("default");
        let mut statement = connection.prepare(Statement::new(
            Command::Delete,
            arguments! { "table" => "news", "id" => 1 },
        ));
        let err = statement.execute().unwrap_err();
        assert_eq!(err.to_string(), "Failed to execute statement");
        assert_eq!(statement.state(), StatementState::Failed);
        assert_eq!(statement.error_info().unwrap().kind, "statement");
    }

    #[test]
    fn test_error_info_recorded() {
        let (connection, client) = connection("entry");
        client.fail(
            Method::Get,
            "builder/structures/news",
            ApiError::client(403, json!({ "error": { "message": "Forbidden" } })),
        );
        let mut statement = connection.prepare(Statement::new(
            Command::TableExists,
            arguments! { "table" => "news" },
        ));
        assert!(statement.execute_probe().is_err());
        assert_eq!(statement.error_code(), Some(403));
        let info = statement.error_info().unwrap();
        assert_eq!(info.kind, "remote");
        assert_eq!(info.message, "Forbidden (Table: entry_news)");
    }

    #[test]
    fn test_probe_false_is_not_an_error() {
        let (connection, client) = connection("entry");
        client.fail(Method::Get, "builder/structures/news", ApiError::not_found());
        let mut statement = connection.prepare(Statement::new(
            Command::TableExists,
            arguments! { "table" => "news" },
        ));
        assert!(!statement.execute_probe().unwrap());
        assert!(statement.error_info().is_none());
    }
}
