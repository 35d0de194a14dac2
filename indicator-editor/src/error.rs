//! Error types for the editing pipeline

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors surfaced by the editing pipeline.
///
/// Every variant is recoverable by user action (retry, fix the input,
/// or discard pending edits).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// Edit rejected locally; never reaches the network
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    /// Transport failure or non-success response
    #[error("Network error: {0}")]
    Network(String),

    /// Indicator or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server rejected the batch update
    #[error("Update rejected: {0}")]
    SubmitRejected(String),

    /// Operation called in a state that forbids it
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// Fact id is not part of the loaded grid
    #[error("Unknown fact: {0}")]
    UnknownFact(String),

    /// Column is neither the value column nor a declared dimension
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Grid payload breaks a structural invariant
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EditorError {
    /// True when the failure came from the network collaborator and a
    /// plain retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EditorError::Network(_))
    }
}

impl From<GatewayError> for EditorError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(msg) => EditorError::Network(msg),
            GatewayError::Parse(msg) => EditorError::Network(format!("invalid response: {}", msg)),
            GatewayError::NotFound(msg) => EditorError::NotFound(msg),
            GatewayError::Validation(msg) => EditorError::SubmitRejected(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_mapping() {
        assert_eq!(
            EditorError::from(GatewayError::Validation("stale row".into())),
            EditorError::SubmitRejected("stale row".into())
        );
        assert_eq!(
            EditorError::from(GatewayError::NotFound("indicator 9".into())),
            EditorError::NotFound("indicator 9".into())
        );
        assert!(EditorError::from(GatewayError::Parse("eof".into())).is_retryable());
        assert!(!EditorError::SubmitRejected("x".into()).is_retryable());
    }

    #[test]
    fn test_invalid_state_message() {
        let err = EditorError::InvalidState {
            operation: "commit",
            state: "Clean".into(),
        };
        assert_eq!(err.to_string(), "Cannot commit while session is Clean");
    }
}
