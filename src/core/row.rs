use serde_json::Value as JsonValue;

/// One result row: an ordered JSON object as returned by the API.
pub type Row = serde_json::Map<String, JsonValue>;

/// Builds a row from `(column, value)` pairs.
pub fn row_from_pairs<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, JsonValue)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Renders a cell for display: strings unquoted, null as `NULL`.
#[must_use]
pub fn display_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Deep-merges `overlay` into `base`: objects merge key by key, arrays are
/// concatenated, and any other value in `overlay` replaces the one in `base`.
pub fn merge_json(base: &mut JsonValue, overlay: JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base), JsonValue::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (JsonValue::Array(base), JsonValue::Array(overlay)) => base.extend(overlay),
        (base, overlay) => *base = overlay,
    }
}
