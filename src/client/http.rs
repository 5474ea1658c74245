use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::debug;

use super::{ApiClient, ApiError, ApiResult, Method};
use crate::config::ConnectionConfig;
use crate::core::{DriverError, Result};

/// Blocking reqwest client authenticated with the connection's key pair.
#[derive(Debug)]
pub struct HttpClient {
    http: reqwest::blocking::Client,
    base_url: String,
    public_key: String,
    private_key: String,
}

impl HttpClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(DriverError::configuration(format!(
                "Connection [{}] has no base_url.",
                config.name
            )));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DriverError::Configuration {
                message: format!("Unable to build HTTP client for connection [{}]: {e}", config.name),
                source: None,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl ApiClient for HttpClient {
    fn request(&self, method: Method, path: &str, body: Option<&JsonValue>) -> ApiResult {
        let url = self.url(path);
        debug!(%method, %url, "api request");

        let mut request = self
            .http
            .request(reqwest_method(method), &url)
            .basic_auth(&self.public_key, Some(&self.private_key));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;

        if status.is_client_error() || status.is_server_error() {
            let message = format!("{method} {url} resulted in a `{status}` response");
            let body = serde_json::from_str(&text).ok();
            let code = status.as_u16();
            return Err(if status.is_client_error() {
                ApiError::Client { status: code, message, body }
            } else {
                ApiError::Server { status: code, message, body }
            });
        }

        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
