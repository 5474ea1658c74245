// contentql - SQL-shaped driver for a content-management REST API
// Relational queries compile into search requests; DDL into structure API calls

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

// Values, rows, column metadata, errors
pub mod core;

// Connection settings (config files + environment)
pub mod config;

// Transport to the content API (HTTP and scripted)
pub mod client;

// SQL front-end and query builder
pub mod parser;

// Query and schema grammars
pub mod compiler;

// Statements, dispatch, bulk mutations, schema builder
pub mod executor;

// Per-resource command implementations
pub mod adapter;

// Connection facade
pub mod connection;

// Re-export commonly used types for convenience
pub use crate::adapter::{Adapter, AdapterRegistry};
pub use crate::client::{ApiClient, ApiError, HttpClient, ScriptedClient};
pub use crate::config::{ConnectionConfig, DriverConfig};
pub use crate::connection::Connection;
pub use crate::core::{ColumnInfo, DriverError, Result, Row, Value};
pub use crate::executor::{Command, PreparedStatement, QueryResult, Statement};
pub use crate::parser::{Query, SqlStatement, parse_statement};
