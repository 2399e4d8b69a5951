//! Transport error taxonomy.

use thiserror::Error;

/// Errors produced by an [`HttpGateway`](super::HttpGateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The href could not be turned into a request URL
    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The underlying HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Network-level failure before a response arrived
    #[error("Connection failed to '{url}': {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded the configured timeout
    #[error("Request to '{url}' timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// Server answered with a non-2xx status
    #[error("Upstream error: {status} from '{url}'")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Response body was not valid JSON
    #[error("Failed to decode response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    /// HTTP status code, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short machine-readable classification for logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::InvalidUrl { .. } => "invalid_url",
            GatewayError::Client(_) => "client_error",
            GatewayError::Connection { .. } => "connection_error",
            GatewayError::Timeout { .. } => "request_timeout",
            GatewayError::Status { .. } => "upstream_error",
            GatewayError::Decode { .. } => "decode_error",
        }
    }
}
