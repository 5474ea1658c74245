//! The raw search shared by every adapter's `select`.

use serde_json::{Value as JsonValue, json};
use tracing::debug;

use super::ExecContext;
use super::errors::translate;
use crate::core::{Result, Row};
use crate::executor::command::Arguments;

pub const SEARCH_PATH: &str = "search/raw";

/// Posts the request to the search endpoint against `table` and emits one
/// row per hit source. An `aggregate` aggregation becomes one trailing row.
pub fn perform_select(cx: &mut ExecContext<'_>, table: &str, arguments: &Arguments) -> Result<bool> {
    let mut request = arguments.clone();
    request.insert("table".into(), json!(table));
    debug!(table, "search");

    let response = cx
        .client()
        .post(SEARCH_PATH, &JsonValue::Object(request))
        .map_err(|err| translate(err, None))?;

    let mut rows = hit_sources(&response);
    if let Some(row) = aggregate_row(&response) {
        rows.push(row);
    }

    cx.set_affected_rows(total_hits(&response).unwrap_or(rows.len() as u64));
    cx.emit_all(rows);
    Ok(true)
}

fn hit_sources(response: &JsonValue) -> Vec<Row> {
    response
        .pointer("/hits/hits")
        .and_then(JsonValue::as_array)
        .map(|hits| {
            hits.iter()
                .map(|hit| {
                    hit.get("_source")
                        .and_then(JsonValue::as_object)
                        .cloned()
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `hits.total` is either a number or `{ "value": n }`.
fn total_hits(response: &JsonValue) -> Option<u64> {
    let total = response.pointer("/hits/total")?;
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(JsonValue::as_u64))
}

fn aggregate_row(response: &JsonValue) -> Option<Row> {
    let mut aggregations = response.get("aggregations")?.as_object()?.clone();
    if let Some(value) = aggregations
        .get("aggregate")
        .and_then(|aggregate| aggregate.get("value"))
        .cloned()
    {
        aggregations.insert("aggregate".into(), value);
    }
    Some(aggregations)
}
