use std::borrow::Cow;

use super::Adapter;
use crate::core::{FieldType, ReservedField};

const RESERVED_FIELDS: &[ReservedField] = &[
    ReservedField::new("id", FieldType::Integer, "Primary key").autoincrement(),
    ReservedField::new("group_id", FieldType::Integer, "Group ID"),
    ReservedField::new("type", FieldType::String, "Type"),
    ReservedField::new("name", FieldType::String, "Name"),
    ReservedField::new("url", FieldType::String, "URL"),
    ReservedField::new("children_inherit_url", FieldType::Boolean, "Children inherit URL"),
    ReservedField::new("template", FieldType::String, "Template"),
    ReservedField::new("published", FieldType::Boolean, "Published"),
    ReservedField::new("revision", FieldType::Integer, "Revision"),
    ReservedField::new("created", FieldType::Datetime, "Created"),
    ReservedField::new("updated", FieldType::Datetime, "Updated"),
    ReservedField::new("use_time", FieldType::Boolean, "Use time"),
    ReservedField::new("start", FieldType::Datetime, "Start"),
    ReservedField::new("stop", FieldType::Datetime, "Stop"),
    ReservedField::new("visible", FieldType::Boolean, "Visible"),
    ReservedField::new("visible_nav", FieldType::Boolean, "Visible in navigation"),
    ReservedField::new("visible_subnav", FieldType::Boolean, "Visible in subnavigation"),
    ReservedField::new(
        "nav_hidden_xs",
        FieldType::Boolean,
        "Hidden in navigation on extra small screens",
    ),
    ReservedField::new("nav_hidden_sm", FieldType::Boolean, "Hidden in navigation on small screens"),
    ReservedField::new("nav_hidden_md", FieldType::Boolean, "Hidden in navigation on medium screens"),
    ReservedField::new("nav_hidden_lg", FieldType::Boolean, "Hidden in navigation on large screens"),
    ReservedField::new("nav_target", FieldType::String, "Navigation target"),
    ReservedField::new("parent_id", FieldType::Integer, "Parent ID"),
    ReservedField::new("image", FieldType::String, "Image"),
    ReservedField::new("icon", FieldType::String, "Icon"),
    ReservedField::new("title", FieldType::String, "Title"),
    ReservedField::new("description", FieldType::String, "Description"),
    ReservedField::new("keywords", FieldType::Array, "Keywords"),
    ReservedField::new("navtitle", FieldType::String, "Navigation title"),
    ReservedField::new("sorting", FieldType::Integer, "Sorting"),
    ReservedField::new("lang", FieldType::String, "Language"),
    ReservedField::new("add_to_head", FieldType::String, "Add to head"),
    ReservedField::new("add_to_bodyclose", FieldType::String, "Add to body close"),
    ReservedField::new("body_class", FieldType::String, "Body class"),
    ReservedField::new("public", FieldType::Boolean, "Public"),
    ReservedField::new("authgroups", FieldType::Array, "Authgroups"),
    ReservedField::new("author", FieldType::String, "Author"),
    ReservedField::new("userid", FieldType::Integer, "User ID"),
    ReservedField::new("config", FieldType::Json, "Config"),
    ReservedField::new(
        "children_inherit_permissions",
        FieldType::Boolean,
        "Children inherit permissions",
    ),
];

/// Built-in pages: searchable, never created or mutated through the driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAdapter;

impl Adapter for PageAdapter {
    fn name(&self) -> &'static str {
        "page"
    }

    fn reserved_table_names(&self) -> &'static [&'static str] {
        &["page"]
    }

    fn reserved_fields(&self) -> &'static [ReservedField] {
        RESERVED_FIELDS
    }

    /// Whatever the query names, pages live in one index.
    fn table_name<'t>(&self, _table: &'t str) -> Cow<'t, str> {
        Cow::Borrowed("page")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ExecContext;
    use crate::adapter::search::SEARCH_PATH;
    use crate::arguments;
    use crate::client::{Method, ScriptedClient};
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn test_select_always_targets_page() {
        let client = ScriptedClient::new();
        client.respond(
            Method::Post,
            SEARCH_PATH,
            json!({ "hits": { "total": 1, "hits": [{ "_source": { "id": 1, "url": "home/" } }] } }),
        );
        let slot = RefCell::new(None);
        let mut cx = ExecContext::new(&client, &slot);
        let args = arguments! { "table" => "pages", "size" => 10 };
        assert!(PageAdapter.select(&mut cx, &args).unwrap());

        let sent = client.requests_to(Method::Post, SEARCH_PATH);
        assert_eq!(sent[0].body.as_ref().unwrap()["table"], json!("page"));
        let (rows, affected) = cx.finish();
        assert_eq!(affected, 1);
        assert_eq!(rows[0]["url"], json!("home/"));
    }

    #[test]
    fn test_pages_are_read_only() {
        let client = ScriptedClient::new();
        let slot = RefCell::new(None);
        let mut cx = ExecContext::new(&client, &slot);
        let args = arguments! { "table" => "page", "id" => 1, "payload" => serde_json::json!({ "name": "x" }) };
        assert!(!PageAdapter.update(&mut cx, &args).unwrap());
        assert!(!PageAdapter.delete(&mut cx, &args).unwrap());
        assert!(PageAdapter.table_exists(&mut cx, &args).unwrap());
        assert!(client.requests().is_empty());
        assert!(PageAdapter.is_reserved_field("visible_nav"));
        assert!(PageAdapter.is_reserved_table("page"));
    }
}
