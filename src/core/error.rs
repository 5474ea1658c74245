use thiserror::Error;

use crate::client::ApiError;

#[derive(Error, Debug)]
pub enum DriverError {
    /// The remote API rejected the payload with field-level messages.
    #[error("{message}")]
    Validation {
        message: String,
        #[source]
        source: ApiError,
    },
    #[error("{message}")]
    Remote {
        message: String,
        status: Option<u16>,
        #[source]
        source: ApiError,
    },
    #[error("This database engine does not support {0}.")]
    Unsupported(String),
    #[error("Unsupported command [{0}]")]
    UnsupportedCommand(String),
    #[error("{message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<Box<DriverError>>,
    },
    #[error("{message}")]
    Statement { code: Option<u16>, message: String },
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DriverError {
    /// `Unsupported` error for a query-builder operation such as `whereColumn`.
    #[must_use]
    pub fn unsupported_operation(operation: &str) -> Self {
        Self::Unsupported(format!("the [{operation}] operation"))
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status (or statement code) associated with the error, if any.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Validation { source, .. } => source.status(),
            Self::Remote { status, .. } => *status,
            Self::Statement { code, .. } => *code,
            _ => None,
        }
    }

    /// Short kind name used in statement error info.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Remote { .. } => "remote",
            Self::Unsupported(_) => "unsupported",
            Self::UnsupportedCommand(_) => "unsupported_command",
            Self::Configuration { .. } | Self::Config(_) => "configuration",
            Self::Statement { .. } => "statement",
            Self::InvalidQuery(_) | Self::Parse(_) => "query",
            Self::Io(_) | Self::Serialization(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
