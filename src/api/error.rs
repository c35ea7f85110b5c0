//! Error types for the Shotgun API client
//!
//! Every failure the client can produce is a [`ShotgunError`]. The variants
//! separate problems caught locally before any network access from problems
//! reported by the transport or by the server, so callers can branch on the
//! kind instead of inspecting messages.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShotgunError>;

#[derive(Debug, Error)]
pub enum ShotgunError {
    /// Malformed client-side input, raised before anything is sent.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The transport answered with a non-success HTTP status.
    #[error("protocol error {status}: {reason}")]
    Protocol { status: u16, reason: String },

    /// The server accepted the request but rejected it at the application layer.
    #[error("server fault: {0}")]
    Fault(String),

    /// Unusable client configuration or server metadata.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The operation no longer exists in this API.
    #[error("{0} has been removed from the API")]
    Removed(&'static str),

    /// The server answered with a body this client cannot interpret.
    #[error("malformed response: {0}")]
    Response(String),

    /// The transport could not complete the exchange.
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShotgunError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn response(message: impl Into<String>) -> Self {
        Self::Response(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    /// Whether a caller may reasonably retry the same request.
    ///
    /// Only transport-level failures qualify; validation errors and faults
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::Transport(_))
    }
}

impl From<reqwest::Error> for ShotgunError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::Protocol {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            },
            None => Self::Transport(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinguishable() {
        assert!(ShotgunError::validation("bad filter").is_validation());
        assert!(ShotgunError::Fault("bad credentials".to_string()).is_fault());
        assert!(!ShotgunError::Fault("bad credentials".to_string()).is_retryable());
        assert!(ShotgunError::Protocol { status: 503, reason: "Service Unavailable".to_string() }.is_retryable());
        assert!(ShotgunError::Transport("connection reset".to_string()).is_retryable());
        assert!(!ShotgunError::configuration("no version").is_retryable());
    }

    #[test]
    fn test_messages() {
        let err = ShotgunError::Protocol { status: 300, reason: "reason".to_string() };
        assert_eq!(err.to_string(), "protocol error 300: reason");
        assert_eq!(ShotgunError::Removed("schema").to_string(), "schema has been removed from the API");
    }
}
