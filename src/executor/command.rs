//! Command vocabulary shared by the grammars and the adapters.
//!
//! A `Statement` is the unit of work handed to `PreparedStatement`: a closed
//! `Command` plus a JSON object of arguments.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::core::{DriverError, Result};

pub type Arguments = serde_json::Map<String, JsonValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Search,
    Insert,
    Update,
    Delete,
    TableExists,
    TableCreate,
    TableDrop,
    TableDropIfExists,
    TableColumnsSelect,
    TableColumnExists,
    TableColumnAdd,
    TableColumnAlter,
    TableColumnDrop,
    TableColumnDropIfExists,
}

impl Command {
    pub const ALL: [Self; 14] = [
        Self::Search,
        Self::Insert,
        Self::Update,
        Self::Delete,
        Self::TableExists,
        Self::TableCreate,
        Self::TableDrop,
        Self::TableDropIfExists,
        Self::TableColumnsSelect,
        Self::TableColumnExists,
        Self::TableColumnAdd,
        Self::TableColumnAlter,
        Self::TableColumnDrop,
        Self::TableColumnDropIfExists,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::TableExists => "table_exists",
            Self::TableCreate => "table_create",
            Self::TableDrop => "table_drop",
            Self::TableDropIfExists => "table_drop_if_exists",
            Self::TableColumnsSelect => "table_columns_select",
            Self::TableColumnExists => "table_column_exists",
            Self::TableColumnAdd => "table_column_add",
            Self::TableColumnAlter => "table_column_alter",
            Self::TableColumnDrop => "table_column_drop",
            Self::TableColumnDropIfExists => "table_column_drop_if_exists",
        }
    }

    /// Commands that change remote state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(
            self,
            Self::Search | Self::TableExists | Self::TableColumnsSelect | Self::TableColumnExists
        )
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DriverError::UnsupportedCommand(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    command: Command,
    arguments: Arguments,
}

impl Statement {
    #[must_use]
    pub const fn new(command: Command, arguments: Arguments) -> Self {
        Self { command, arguments }
    }

    /// Builds a statement from its wire form `{"command": "...", "arguments": {...}}`.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let command = json
            .get("command")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| DriverError::InvalidQuery("statement without a command".to_string()))?
            .parse::<Command>()?;
        let arguments = match json.get("arguments") {
            Some(JsonValue::Object(arguments)) => arguments.clone(),
            None | Some(JsonValue::Null) => Arguments::new(),
            Some(other) => {
                return Err(DriverError::InvalidQuery(format!(
                    "statement arguments must be an object, got {other}"
                )))
            }
        };
        Ok(Self::new(command, arguments))
    }

    #[must_use]
    pub const fn command(&self) -> Command {
        self.command
    }

    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        serde_json::json!({
            "command": self.command.as_str(),
            "arguments": self.arguments,
        })
    }
}

/// Builds an `Arguments` object from `key => value` pairs.
#[macro_export]
macro_rules! arguments {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut arguments = $crate::executor::command::Arguments::new();
        $(arguments.insert(($key).to_string(), serde_json::json!($value));)*
        arguments
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(command.as_str().parse::<Command>().unwrap(), command);
            assert_eq!(
                serde_json::to_value(command).unwrap(),
                json!(command.as_str())
            );
        }
    }

    #[test]
    fn test_unknown_command_is_unsupported() {
        let err = "table_truncate".parse::<Command>().unwrap_err();
        assert!(matches!(err, DriverError::UnsupportedCommand(name) if name == "table_truncate"));
    }

    #[test]
    fn test_statement_from_json() {
        let statement = Statement::from_json(&json!({
            "command": "table_exists",
            "arguments": {"table": "news"}
        }))
        .unwrap();
        assert_eq!(statement.command(), Command::TableExists);
        assert_eq!(statement.arguments().get("table"), Some(&json!("news")));
        assert_eq!(statement.to_json()["command"], json!("table_exists"));

        let err = Statement::from_json(&json!({"command": "explode"})).unwrap_err();
        assert!(matches!(err, DriverError::UnsupportedCommand(_)));
    }

    #[test]
    fn test_mutation_flags() {
        assert!(!Command::Search.is_mutation());
        assert!(Command::TableColumnAdd.is_mutation());
    }

    #[test]
    fn test_arguments_macro() {
        let arguments = crate::arguments! { "table" => "news", "size" => 3 };
        assert_eq!(arguments.get("size"), Some(&json!(3)));
    }
}
