use serde_json::{Value as JsonValue, json};
use tracing::{debug, warn};

use super::command::{Arguments, Command, Statement};
use crate::compiler::MAX_QUERY_SIZE;
use crate::connection::Connection;
use crate::core::Result;
use crate::core::row::merge_json;

/// Identifier-only search over `index` for the rows matching `clause`.
#[must_use]
pub fn compile_id_search(index: &str, clause: Arguments) -> Statement {
    let mut request = JsonValue::Object(clause);
    merge_json(
        &mut request,
        json!({ "_source": ["id"], "size": MAX_QUERY_SIZE, "table": index }),
    );
    match request {
        JsonValue::Object(request) => Statement::new(Command::Search, request),
        _ => Statement::new(Command::Search, Arguments::new()),
    }
}

/// Finds the ids matching `clause` and runs `action` once per id, in order.
///
/// Returns how many actions succeeded. A failing id is logged and skipped.
/// Only the first page of ids is visited.
pub fn perform_bulk_action<F>(
    connection: &Connection,
    index: &str,
    clause: Arguments,
    mut action: F,
) -> Result<u64>
where
    F: FnMut(&JsonValue) -> Result<()>,
{
    let mut search = connection.prepare(compile_id_search(index, clause));
    search.execute()?;

    let ids: Vec<JsonValue> = search
        .fetch_all()
        .into_iter()
        .filter_map(|mut row| row.remove("id"))
        .filter(|id| !id.is_null())
        .collect();
    if ids.len() >= MAX_QUERY_SIZE {
        warn!(index, limit = MAX_QUERY_SIZE, "bulk action limited to the first page of rows");
    }
    debug!(index, rows = ids.len(), "bulk action");

    let mut succeeded = 0;
    for id in &ids {
        match action(id) {
            Ok(()) => succeeded += 1,
            Err(err) => warn!(index, %id, error = %err, "bulk action failed for row"),
        }
    }
    Ok(succeeded)
}
