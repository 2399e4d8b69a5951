use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors returned by binding operations.
///
/// None of these are fatal: a binding that failed a load or an execution
/// stays usable for the next attempt.
#[derive(Debug, Error)]
pub enum BindingError {
    /// A GET succeeded but carried no resource
    #[error("Empty response body from '{url}'")]
    EmptyResponseBody { url: String },

    /// Network or HTTP failure from the gateway
    #[error(transparent)]
    Transport(#[from] GatewayError),

    /// Execute was called while the action is unavailable or unconnected
    #[error("Action '{action}' is not available")]
    ActionNotAvailable { action: String },

    /// URL construction for a relation that does not resolve
    #[error("Link '{relation}' is missing")]
    LinkMissing { relation: String },

    /// A newer request on the same binding replaced this one
    #[error("Request superseded by a newer request on the same binding")]
    Superseded,

    /// Connecting requires a running tokio runtime
    #[error("No tokio runtime available to drive binding requests")]
    NoRuntime,
}

impl BindingError {
    pub fn error_type(&self) -> &'static str {
        match self {
            BindingError::EmptyResponseBody { .. } => "empty_response_body",
            BindingError::Transport(_) => "transport_error",
            BindingError::ActionNotAvailable { .. } => "action_not_available",
            BindingError::LinkMissing { .. } => "link_missing",
            BindingError::Superseded => "superseded",
            BindingError::NoRuntime => "no_runtime",
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, BindingError::Superseded)
    }
}

/// Snapshot of an execution failure, kept in action state.
///
/// The error itself goes back to the caller; state only records what the UI
/// needs to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    pub message: String,
    pub status: Option<u16>,
}

impl From<&GatewayError> for ActionFailure {
    fn from(err: &GatewayError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status(),
        }
    }
}

impl From<&BindingError> for ActionFailure {
    fn from(err: &BindingError) -> Self {
        match err {
            BindingError::Transport(cause) => cause.into(),
            other => Self {
                message: other.to_string(),
                status: None,
            },
        }
    }
}
