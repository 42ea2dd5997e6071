//! Error types for the simulation core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Sim Error Enum ==
/// Errors surfaced to callers of the store's action surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Caller supplied an invalid argument
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Operation requires a key that is not present
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A collaborator (e.g. the push client) is not running
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl SimError {
    /// Shorthand for building a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        SimError::Validation(msg.into())
    }
}

// == Channel Error Enum ==
/// Transport-level failures of the push channel.
///
/// These never reach HTTP callers; the push client recovers from them through
/// its reconnect policy and records the message as `last_error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel could not be opened
    #[error("failed to open channel: {0}")]
    Connect(String),

    /// An open channel failed while reading or writing
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound frame could not be decoded
    #[error("malformed message: {0}")]
    Malformed(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ChannelError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ChannelError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        ChannelError::Malformed(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        let status = match &self {
            SimError::Validation(_) => StatusCode::BAD_REQUEST,
            SimError::NotFound(_) => StatusCode::NOT_FOUND,
            SimError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the simulation core.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_status() {
        let response = SimError::validation("empty key").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_status() {
        let response = SimError::NotFound("a".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_channel_error_from_json() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(ChannelError::from(err), ChannelError::Malformed(_)));
    }
}
