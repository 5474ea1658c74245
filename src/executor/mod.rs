// Command vocabulary and wire shape of a compiled statement
pub mod command;

// Command -> adapter method table
pub mod dispatcher;

// Prepared statement state machine and result buffer
pub mod statement;

// Search-then-mutate strategy for updates and deletes without an id
pub mod bulk;

// Schema operations bound to a connection
pub mod schema;

use crate::core::Row;

pub use command::{Arguments, Command, Statement};
pub use schema::SchemaBuilder;
pub use statement::{ErrorInfo, PreparedStatement, StatementState};

/// Outcome of running one SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Affected(u64),
    Success(String),
}
