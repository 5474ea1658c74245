//! Transport to the content API.
//!
//! Adapters only see [`ApiClient`]; the HTTP implementation lives in
//! [`http`] and the recording test double in [`scripted`].

pub mod http;
pub mod scripted;

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

pub use http::HttpClient;
pub use scripted::{RecordedRequest, ScriptedClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// 4xx response; `body` is the decoded JSON body when there was one.
    #[error("{message}")]
    Client {
        status: u16,
        message: String,
        body: Option<JsonValue>,
    },
    /// 5xx response.
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        body: Option<JsonValue>,
    },
    /// The request never produced a response.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Arc<reqwest::Error>>,
    },
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    #[must_use]
    pub fn client(status: u16, body: JsonValue) -> Self {
        Self::Client {
            status,
            message: format!("Client error: {status}"),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn server(status: u16, body: JsonValue) -> Self {
        Self::Server {
            status,
            message: format!("Server error: {status}"),
            body: Some(body),
        }
    }

    /// Transport failure without an underlying HTTP error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::Client {
            status: 404,
            message: "Client error: 404 Not Found".to_string(),
            body: None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub const fn body(&self) -> Option<&JsonValue> {
        match self {
            Self::Client { body, .. } | Self::Server { body, .. } => body.as_ref(),
            Self::Transport { .. } | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Client { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }
}

pub type ApiResult = std::result::Result<JsonValue, ApiError>;

/// JSON-over-HTTP client of the content API. Paths are relative to the
/// connection's base URL (`search/raw`, `builder/structures/...`).
pub trait ApiClient: std::fmt::Debug + Send + Sync {
    fn request(&self, method: Method, path: &str, body: Option<&JsonValue>) -> ApiResult;

    fn get(&self, path: &str) -> ApiResult {
        self.request(Method::Get, path, None)
    }

    fn post(&self, path: &str, body: &JsonValue) -> ApiResult {
        self.request(Method::Post, path, Some(body))
    }

    fn put(&self, path: &str, body: &JsonValue) -> ApiResult {
        self.request(Method::Put, path, Some(body))
    }

    fn delete(&self, path: &str) -> ApiResult {
        self.request(Method::Delete, path, None)
    }
}
