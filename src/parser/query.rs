use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::core::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BooleanOp {
    #[default]
    And,
    Or,
}

impl BooleanOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Comparison operators accepted by basic and date clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Like,
    NotLike,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Like => "like",
            Self::NotLike => "not like",
        }
    }

    #[must_use]
    pub const fn is_pattern(self) -> bool {
        matches!(self, Self::Like | Self::NotLike)
    }

    #[must_use]
    pub const fn is_range(self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::LtEq | Self::GtEq)
    }
}

impl std::str::FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::NotEq),
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::LtEq),
            ">=" => Ok(Self::GtEq),
            "like" => Ok(Self::Like),
            "not like" => Ok(Self::NotLike),
            other => Err(format!("Unknown operator '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePart {
    Date,
    Year,
    Month,
    Day,
    Time,
}

impl DatePart {
    /// Query-builder operation name, used in error messages.
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::Date => "whereDate",
            Self::Year => "whereYear",
            Self::Month => "whereMonth",
            Self::Day => "whereDay",
            Self::Time => "whereTime",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WhereKind {
    Basic {
        column: String,
        operator: Operator,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// Set membership emitted verbatim, without escaping.
    InRaw {
        column: String,
        values: Vec<Value>,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },
    Null {
        column: String,
    },
    NotNull {
        column: String,
    },
    Nested {
        query: Box<Query>,
    },
    Raw {
        sql: String,
        bindings: Vec<Value>,
    },
    FullText {
        columns: Vec<String>,
        value: String,
    },
    Date {
        part: DatePart,
        column: String,
        operator: Operator,
        value: Value,
    },
    Exists {
        query: Box<Query>,
    },
    Column {
        first: String,
        operator: Operator,
        second: String,
    },
    BetweenColumns {
        column: String,
        low: String,
        high: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    pub boolean: BooleanOp,
    pub kind: WhereKind,
}

impl WhereClause {
    #[must_use]
    pub const fn new(boolean: BooleanOp, kind: WhereKind) -> Self {
        Self { boolean, kind }
    }

    #[must_use]
    pub const fn and(kind: WhereKind) -> Self {
        Self::new(BooleanOp::And, kind)
    }

    #[must_use]
    pub const fn or(kind: WhereKind) -> Self {
        Self::new(BooleanOp::Or, kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderBy {
    Column { column: String, direction: SortOrder },
    /// Relevance-scoring expression; results sort by `_score`.
    Raw { expression: JsonValue, direction: SortOrder },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectColumn {
    Named(String),
    Raw(JsonValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    Avg,
    Min,
    Max,
    Cardinality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub columns: Vec<String>,
}

/// Relational query handed to the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Query {
    pub table: String,
    pub columns: Vec<SelectColumn>,
    pub wheres: Vec<WhereClause>,
    pub orders: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub aggregate: Option<Aggregate>,
    pub distinct: bool,
}

impl Query {
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| SelectColumn::Named(c.into())));
        self
    }

    #[must_use]
    pub fn select_raw(mut self, expression: JsonValue) -> Self {
        self.columns.push(SelectColumn::Raw(expression));
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub fn push_where(mut self, boolean: BooleanOp, kind: WhereKind) -> Self {
        self.wheres.push(WhereClause::new(boolean, kind));
        self
    }

    /// `where column = value`
    #[must_use]
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    #[must_use]
    pub fn where_op(self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.push_where(
            BooleanOp::And,
            WhereKind::Basic {
                column: column.to_string(),
                operator,
                value: value.into(),
            },
        )
    }

    #[must_use]
    pub fn or_where_op(self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.push_where(
            BooleanOp::Or,
            WhereKind::Basic {
                column: column.to_string(),
                operator,
                value: value.into(),
            },
        )
    }

    #[must_use]
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(
            BooleanOp::And,
            WhereKind::In {
                column: column.to_string(),
                values: values.into_iter().map(Into::into).collect(),
                negated: false,
            },
        )
    }

    #[must_use]
    pub fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(
            BooleanOp::And,
            WhereKind::In {
                column: column.to_string(),
                values: values.into_iter().map(Into::into).collect(),
                negated: true,
            },
        )
    }

    #[must_use]
    pub fn where_in_raw<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(
            BooleanOp::And,
            WhereKind::InRaw {
                column: column.to_string(),
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    #[must_use]
    pub fn where_between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.push_where(
            BooleanOp::And,
            WhereKind::Between {
                column: column.to_string(),
                low: low.into(),
                high: high.into(),
                negated: false,
            },
        )
    }

    #[must_use]
    pub fn where_null(self, column: &str) -> Self {
        self.push_where(
            BooleanOp::And,
            WhereKind::Null {
                column: column.to_string(),
            },
        )
    }

    #[must_use]
    pub fn or_where_null(self, column: &str) -> Self {
        self.push_where(
            BooleanOp::Or,
            WhereKind::Null {
                column: column.to_string(),
            },
        )
    }

    #[must_use]
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(
            BooleanOp::And,
            WhereKind::NotNull {
                column: column.to_string(),
            },
        )
    }

    /// Groups the clauses built by `build` in parentheses.
    #[must_use]
    pub fn where_nested(self, boolean: BooleanOp, build: impl FnOnce(Self) -> Self) -> Self {
        let nested = build(Self::table(self.table.clone()));
        self.push_where(
            boolean,
            WhereKind::Nested {
                query: Box::new(nested),
            },
        )
    }

    #[must_use]
    pub fn where_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.push_where(
            BooleanOp::And,
            WhereKind::Raw {
                sql: sql.to_string(),
                bindings,
            },
        )
    }

    #[must_use]
    pub fn where_full_text<I, S>(self, columns: I, value: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_where(
            BooleanOp::And,
            WhereKind::FullText {
                columns: columns.into_iter().map(Into::into).collect(),
                value: value.to_string(),
            },
        )
    }

    #[must_use]
    pub fn where_year(self, column: &str, operator: Operator, year: i64) -> Self {
        self.push_where(
            BooleanOp::And,
            WhereKind::Date {
                part: DatePart::Year,
                column: column.to_string(),
                operator,
                value: Value::Integer(year),
            },
        )
    }

    #[must_use]
    pub fn order_by(mut self, column: &str, direction: SortOrder) -> Self {
        self.orders.push(OrderBy::Column {
            column: column.to_string(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn order_by_raw(mut self, expression: JsonValue, direction: SortOrder) -> Self {
        self.orders.push(OrderBy::Raw {
            expression,
            direction,
        });
        self
    }

    /// Random ordering through a seeded scoring function; the seed defaults
    /// to the current unix time.
    #[must_use]
    pub fn in_random_order(self, seed: Option<i64>) -> Self {
        let seed = seed.unwrap_or_else(|| chrono::Utc::now().timestamp());
        self.order_by_raw(
            json!({ "function_score": { "random_score": { "seed": seed } } }),
            SortOrder::Asc,
        )
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn aggregate<I, S>(mut self, function: AggregateFunction, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aggregate = Some(Aggregate {
            function,
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Single-id target: exactly one `id = value` basic clause.
    #[must_use]
    pub fn target_id(&self) -> Option<&Value> {
        match self.wheres.as_slice() {
            [
                WhereClause {
                    kind:
                        WhereKind::Basic {
                            column,
                            operator: Operator::Eq,
                            value,
                        },
                    ..
                },
            ] if (column == "id" || column.ends_with(".id")) && !value.is_null() => Some(value),
            _ => None,
        }
    }
}
