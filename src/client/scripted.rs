use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use serde_json::Value as JsonValue;
use tracing::debug;

use super::{ApiClient, ApiResult, ApiError, Method};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<JsonValue>,
}

impl std::fmt::Display for RecordedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(body) = &self.body {
            write!(f, " {body}")?;
        }
        Ok(())
    }
}

/// In-memory [`ApiClient`]: records every request and replays responses
/// scripted per `(method, path)`.
///
/// Responses queued for a route are consumed in order; the last one keeps
/// answering. Unscripted routes answer `{}`.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResult>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, response: ApiResult) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub fn respond(&self, method: Method, path: &str, response: JsonValue) -> &Self {
        self.push(method, path, Ok(response))
    }

    pub fn fail(&self, method: Method, path: &str, error: ApiError) -> &Self {
        self.push(method, path, Err(error))
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests sent to one route, in order.
    #[must_use]
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl ApiClient for ScriptedClient {
    fn request(&self, method: Method, path: &str, body: Option<&JsonValue>) -> ApiResult {
        debug!(%method, path, "scripted request");
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method,
                path: path.to_string(),
                body: body.cloned(),
            });

        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Ok(JsonValue::Object(serde_json::Map::new()))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(JsonValue::Object(serde_json::Map::new()))),
            None => Ok(JsonValue::Object(serde_json::Map::new())),
        }
    }
}
