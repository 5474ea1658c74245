use serde::{Deserialize, Serialize};

use super::query::Query;
use crate::core::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlStatement {
    Select(Query),
    Insert {
        table: String,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Update {
        query: Query,
        assignments: Vec<(String, Value)>,
    },
    Delete {
        query: Query,
    },
    CreateTable(Blueprint),
    DropTable {
        name: String,
        if_exists: bool,
    },
    AlterTable {
        name: String,
        operation: AlterTableOperation,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableOperation {
    AddColumn(ColumnDef),
    RenameColumn { from: String, to: String },
    DropColumn { name: String, if_exists: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Remote field type; `text` when absent.
    pub data_type: Option<String>,
    pub nullable: bool,
    pub default: Option<Value>,
    /// Default to the creation timestamp.
    pub use_current: bool,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            nullable: true,
            default: None,
            use_current: false,
        }
    }

    #[must_use]
    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub const fn use_current(mut self) -> Self {
        self.use_current = true;
        self
    }
}

/// Table definition handed to the schema grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Blueprint {
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

impl Blueprint {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
}
