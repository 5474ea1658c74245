//! Translation of remote API failures into driver errors.

use serde_json::Value as JsonValue;

use crate::client::ApiError;
use crate::core::DriverError;

/// Maps an API failure onto the error taxonomy.
///
/// Client errors carrying field messages become `Validation` with the first
/// message. A plain `error.message` becomes `Remote`, suffixed with the
/// resource when one is given. Server errors dig the root cause out of the
/// search engine's message when it is JSON.
#[must_use]
pub fn translate(error: ApiError, resource: Option<&str>) -> DriverError {
    match &error {
        ApiError::Client { status, body, .. } => {
            let status = *status;
            let error_body = body.as_ref().and_then(|body| body.get("error"));

            if let Some(message) = error_body.and_then(first_field_message) {
                return DriverError::Validation {
                    message,
                    source: error,
                };
            }

            let message = match error_body.and_then(|e| e.get("message")).and_then(JsonValue::as_str) {
                Some(message) => match resource {
                    Some(resource) => format!("{message} (Table: {resource})"),
                    None => message.to_string(),
                },
                None => error.to_string(),
            };
            DriverError::Remote {
                message,
                status: Some(status),
                source: error,
            }
        }
        ApiError::Server { status, body, .. } => {
            let status = *status;
            let message = body
                .as_ref()
                .and_then(root_cause_reason)
                .unwrap_or_else(|| error.to_string());
            DriverError::Remote {
                message,
                status: Some(status),
                source: error,
            }
        }
        ApiError::Transport { .. } | ApiError::Decode(_) => DriverError::Remote {
            message: error.to_string(),
            status: None,
            source: error,
        },
    }
}

fn first_field_message(error: &JsonValue) -> Option<String> {
    error
        .get("errors")?
        .as_object()?
        .values()
        .filter_map(|messages| messages.as_array()?.first())
        .map(|message| match message {
            JsonValue::String(message) => message.clone(),
            other => other.to_string(),
        })
        .next()
}

/// `error.message` holds the search engine's own JSON error document.
fn root_cause_reason(body: &JsonValue) -> Option<String> {
    let message = body.get("error")?.get("message")?.as_str()?;
    let inner: JsonValue = serde_json::from_str(message).ok()?;
    inner
        .pointer("/error/root_cause/0/reason")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}
