//! HTTP client error types

use std::time::Duration;

use thiserror::Error;

/// Result type for a single request attempt
pub type Result<T> = std::result::Result<T, ApiError>;

/// Boxed error used to carry the original failure of a transport call
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`crate::ApiClient`] inside the error envelope
///
/// All three kinds share this type so callers can handle them at one site and
/// discriminate with [`ApiError::kind`] when they need to.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure, or any failure that is not otherwise classified
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The request did not complete within its timeout
    #[error("{message}")]
    Timeout { message: String, timeout: Duration },

    /// A response arrived with a status outside `200..=299`
    #[error("{message}")]
    Http {
        message: String,
        status: u16,
        /// Best-effort decoded response body
        body: Option<serde_json::Value>,
    },
}

/// Discriminant of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Timeout,
    Http,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Http => "http",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiError {
    /// Create a network error, optionally wrapping the original failure
    pub fn network(message: impl Into<String>, source: Option<BoxError>) -> Self {
        ApiError::Network {
            message: message.into(),
            source,
        }
    }

    /// Create a timeout error for the given bound
    pub fn timeout(timeout: Duration) -> Self {
        ApiError::Timeout {
            message: format!("Request timed out after {}ms", timeout.as_millis()),
            timeout,
        }
    }

    /// Create an HTTP status error
    pub fn http(status: u16, body: Option<serde_json::Value>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status");

        ApiError::Http {
            message: format!("HTTP {status}: {reason}"),
            status,
            body,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Timeout { .. } => ErrorKind::Timeout,
            ApiError::Http { .. } => ErrorKind::Http,
        }
    }

    /// Human-readable message carried by every kind
    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message, .. }
            | ApiError::Timeout { message, .. }
            | ApiError::Http { message, .. } => message,
        }
    }

    /// Status code for [`ApiError::Http`], `None` otherwise
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded response body for [`ApiError::Http`], when the server sent one
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            ApiError::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Check if error is retryable
    ///
    /// Network failures always are, HTTP errors only for 5xx statuses.
    /// Client errors and timeouts never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network { .. } => true,
            ApiError::Timeout { .. } => false,
            ApiError::Http { status, .. } => (500..=599).contains(status),
        }
    }
}

/// Errors raised while building a client from its configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Base URL is empty or cannot be parsed
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Timeout must be greater than zero
    #[error("Timeout must be greater than zero")]
    InvalidTimeout,

    /// Retry policy values are out of range
    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Underlying transport could not be constructed
    #[error("Failed to build HTTP transport: {0}")]
    BuildError(String),
}
