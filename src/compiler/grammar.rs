use serde_json::{Value as JsonValue, json};

use super::wheres::{compile_where_string, remove_qualified_column};
use crate::core::row::merge_json;
use crate::core::{DriverError, Result, Row};
use crate::executor::command::{Arguments, Command, Statement};
use crate::parser::{Aggregate, AggregateFunction, OrderBy, Query, SelectColumn};

/// Default page size when the query has no limit.
pub const MAX_QUERY_SIZE: usize = 10_000;

/// How an update or delete finds its rows.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationTarget {
    /// One known id.
    Id(JsonValue),
    /// Every row matching the compiled search clause (`{"body": {...}}`).
    Matching(Arguments),
}

/// Compiles relational queries into search requests and mutation statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryGrammar;

impl QueryGrammar {
    pub fn compile_select(query: &Query) -> Result<Statement> {
        Ok(Statement::new(Command::Search, Self::compile_search_request(query)?))
    }

    /// Component by component, deep-merged in order: aggregate, columns,
    /// table, wheres, orders, size, from.
    pub fn compile_search_request(query: &Query) -> Result<Arguments> {
        let mut request = JsonValue::Object(Arguments::new());

        if let Some(aggregate) = &query.aggregate {
            merge_json(&mut request, Self::compile_aggregate(query, aggregate)?);
        }
        if let Some(columns) = Self::compile_columns(&query.columns) {
            merge_json(&mut request, columns);
        }
        merge_json(&mut request, json!({ "table": query.table }));
        merge_json(&mut request, Self::compile_wheres(query)?);
        if !query.orders.is_empty() {
            Self::merge_orders(&mut request, &query.table, &query.orders);
        }
        merge_json(&mut request, json!({ "size": Self::compile_limit(query) }));
        if let Some(offset) = query.offset {
            merge_json(&mut request, json!({ "from": offset }));
        }

        match request {
            JsonValue::Object(request) => Ok(request),
            _ => Ok(Arguments::new()),
        }
    }

    fn compile_aggregate(query: &Query, aggregate: &Aggregate) -> Result<JsonValue> {
        let mut field = aggregate
            .columns
            .first()
            .map(|column| remove_qualified_column(&query.table, column));

        let function = match aggregate.function {
            AggregateFunction::Count => {
                if field.as_deref().is_none_or(|f| f == "*") {
                    field = Some("_uid".to_string());
                }
                if query.distinct { "cardinality" } else { "value_count" }
            }
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Cardinality => "cardinality",
        };

        let field = field.filter(|f| f != "*").ok_or_else(|| {
            DriverError::InvalidQuery(format!("aggregate [{function}] requires a column"))
        })?;

        Ok(json!({ "body": { "aggs": { "aggregate": { function: { "field": field } } } } }))
    }

    fn compile_columns(columns: &[SelectColumn]) -> Option<JsonValue> {
        let selects_all = columns
            .iter()
            .any(|column| matches!(column, SelectColumn::Named(name) if name == "*"));
        if columns.is_empty() || selects_all {
            return None;
        }

        let mut compiled = JsonValue::Object(Arguments::new());
        let named: Vec<&str> = columns
            .iter()
            .filter_map(|column| match column {
                SelectColumn::Named(name) => Some(name.as_str()),
                SelectColumn::Raw(_) => None,
            })
            .collect();
        if !named.is_empty() {
            merge_json(&mut compiled, json!({ "_source": named }));
        }
        for column in columns {
            if let SelectColumn::Raw(expression) = column {
                merge_json(&mut compiled, json!({ "body": { "query": expression } }));
            }
        }
        Some(compiled)
    }

    /// `{"body": {"track_scores": true, "query": {"query_string": {...}}}}`;
    /// the query is omitted when no clause produced a fragment.
    pub fn compile_wheres(query: &Query) -> Result<JsonValue> {
        let mut body = json!({ "track_scores": true });
        if let Some(compiled) = compile_where_string(query)? {
            body["query"] = json!({ "query_string": { "query": compiled } });
        }
        Ok(json!({ "body": body }))
    }

    fn merge_orders(request: &mut JsonValue, table: &str, orders: &[OrderBy]) {
        let mut sort = Vec::with_capacity(orders.len());
        for order in orders {
            match order {
                OrderBy::Column { column, direction } => {
                    let field = remove_qualified_column(table, column);
                    sort.push(json!({ field: { "order": direction.as_str() } }));
                }
                OrderBy::Raw {
                    expression,
                    direction,
                } => {
                    Self::merge_scoring(request, expression.clone());
                    sort.push(json!({ "_score": { "order": direction.as_str() } }));
                }
            }
        }
        merge_json(request, json!({ "body": { "sort": sort } }));
    }

    /// Puts a scoring expression into `body.query`. A bare `function_score`
    /// wraps the existing where query instead of sitting beside it.
    fn merge_scoring(request: &mut JsonValue, mut expression: JsonValue) {
        let existing = request
            .get_mut("body")
            .and_then(|body| body.as_object_mut())
            .and_then(|body| body.remove("query"));

        let wraps = expression
            .get("function_score")
            .is_some_and(|score| score.is_object() && score.get("query").is_none());

        let query = match existing {
            Some(existing) if wraps => {
                expression["function_score"]["query"] = existing;
                expression
            }
            Some(mut existing) => {
                merge_json(&mut existing, expression);
                existing
            }
            None => expression,
        };
        merge_json(request, json!({ "body": { "query": query } }));
    }

    fn compile_limit(query: &Query) -> usize {
        match (query.limit, &query.aggregate) {
            (Some(limit), _) => limit,
            (None, Some(_)) => 0,
            (None, None) => MAX_QUERY_SIZE,
        }
    }

    /// Payload keys lose their table qualifier.
    #[must_use]
    pub fn compile_payload(table: &str, values: &Row) -> Row {
        values
            .iter()
            .map(|(key, value)| (remove_qualified_column(table, key), value.clone()))
            .collect()
    }

    #[must_use]
    pub fn compile_insert(table: &str, values: &Row) -> Statement {
        let mut arguments = Arguments::new();
        arguments.insert("table".into(), json!(table));
        arguments.insert("payload".into(), JsonValue::Object(Self::compile_payload(table, values)));
        Statement::new(Command::Insert, arguments)
    }

    /// A single `id = value` clause targets that id; anything else selects
    /// the matching rows first.
    pub fn compile_target(query: &Query) -> Result<MutationTarget> {
        if let Some(id) = query.target_id() {
            return Ok(MutationTarget::Id(id.to_json()));
        }
        match Self::compile_wheres(query)? {
            JsonValue::Object(clause) => Ok(MutationTarget::Matching(clause)),
            _ => Ok(MutationTarget::Matching(Arguments::new())),
        }
    }

    #[must_use]
    pub fn compile_update(table: &str, id: &JsonValue, values: &Row) -> Statement {
        let mut arguments = Arguments::new();
        arguments.insert("id".into(), id.clone());
        arguments.insert("table".into(), json!(table));
        arguments.insert("payload".into(), JsonValue::Object(Self::compile_payload(table, values)));
        Statement::new(Command::Update, arguments)
    }

    #[must_use]
    pub fn compile_delete(table: &str, id: &JsonValue) -> Statement {
        let mut arguments = Arguments::new();
        arguments.insert("id".into(), id.clone());
        arguments.insert("table".into(), json!(table));
        Statement::new(Command::Delete, arguments)
    }
}
