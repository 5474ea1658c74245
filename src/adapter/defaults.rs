//! Values the content API expects on new and saved entries.

use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

use crate::core::Row;

/// Random unique entry name.
#[must_use]
pub fn fresh_name() -> String {
    Uuid::new_v4().to_string()
}

/// URL slug: lowercase ASCII words joined by `-`.
#[must_use]
pub fn fresh_url(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c != '\'' {
            pending_dash = true;
        }
    }
    slug
}

fn is_unset(payload: &Row, key: &str) -> bool {
    payload.get(key).is_none_or(JsonValue::is_null)
}

/// Saved entries publish their revision unless told otherwise.
pub fn fill_revision_defaults(payload: &mut Row) {
    if is_unset(payload, "revision_publish") {
        payload.insert("revision_publish".into(), json!(true));
    }
}

/// New entries also get a name and a URL derived from it.
pub fn fill_entry_defaults(payload: &mut Row) {
    fill_revision_defaults(payload);
    if is_unset(payload, "name") {
        payload.insert("name".into(), json!(fresh_name()));
    }
    if is_unset(payload, "url") {
        let url = payload
            .get("name")
            .and_then(JsonValue::as_str)
            .map(fresh_url)
            .unwrap_or_default();
        payload.insert("url".into(), json!(url));
    }
}
