//! Single query-string terms (`column:value`, ranges, existence checks).
//!
//! Exact matches render strings as quoted phrases. Pattern and range
//! values are bare and escape every reserved character with a backslash;
//! patterns leave the `*` and `?` wildcards alone.

use crate::core::Value;
use crate::parser::Operator;

const RESERVED: &[char] = &[
    '+', '-', '=', '&', '|', '>', '<', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?',
    ':', '\\', '/',
];

fn escape_bare(text: &str, keep_wildcards: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        let wildcard = c == '*' || c == '?';
        if (RESERVED.contains(&c) && !(keep_wildcards && wildcard)) || c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Escapes a value for substitution into raw query-string text.
#[must_use]
pub fn escape_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Integer(_) | Value::Real(_) | Value::Boolean(_) => value.to_string(),
        Value::Text(_) | Value::Date(_) | Value::Timestamp(_) => {
            escape_bare(&value.to_string(), false)
        }
    }
}

fn render_exact(value: &Value) -> String {
    if value.is_textual() {
        quote(&value.to_string())
    } else {
        value.to_string()
    }
}

fn render_pattern(value: &Value) -> String {
    match value {
        Value::Text(text) => escape_bare(text, true),
        other => render_exact(other),
    }
}

/// `%` becomes the `*` wildcard; outside pattern operators `*` is dropped.
#[must_use]
pub fn prepare_value(operator: Operator, value: &Value) -> Value {
    match value {
        Value::Text(text) => {
            let text = text.replace('%', "*");
            if operator.is_pattern() {
                Value::Text(text)
            } else {
                Value::Text(text.replace('*', ""))
            }
        }
        other => other.clone(),
    }
}

#[must_use]
pub fn exists(column: &str) -> String {
    format!("_exists_:{column}")
}

#[must_use]
pub fn missing(column: &str) -> String {
    format!("NOT _exists_:{column}")
}

/// One term for `column <operator> value`; the value is rendered as given.
#[must_use]
pub fn term(column: &str, operator: Operator, value: &Value) -> String {
    if value.is_null() {
        return match operator {
            Operator::NotEq | Operator::NotLike => exists(column),
            _ => missing(column),
        };
    }

    match operator {
        Operator::Eq => format!("{column}:{}", render_exact(value)),
        Operator::NotEq => format!("NOT {column}:{}", render_exact(value)),
        Operator::Like => format!("{column}:{}", render_pattern(value)),
        Operator::NotLike => format!("NOT {column}:{}", render_pattern(value)),
        Operator::Lt | Operator::Gt | Operator::LtEq | Operator::GtEq => {
            format!("{column}:{}{}", operator.as_str(), escape_value(value))
        }
    }
}

/// `(col:a OR col:b)`; empty when there are no values.
#[must_use]
pub fn any_of(column: &str, values: &[Value]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let terms: Vec<String> = values
        .iter()
        .map(|value| term(column, Operator::Eq, &prepare_value(Operator::Eq, value)))
        .collect();
    format!("({})", terms.join(" OR "))
}

#[must_use]
pub fn range(column: &str, low: &Value, high: &Value) -> String {
    format!(
        "{} AND {}",
        term(column, Operator::GtEq, low),
        term(column, Operator::LtEq, high)
    )
}
