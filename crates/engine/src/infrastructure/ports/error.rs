//! Error types for port operations.

use alchemy_domain::{DomainError, TokenId};

/// Element store errors with context for debugging.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Durable medium failed - includes operation name for tracing.
    #[error("Storage error in {operation}: {message}")]
    Io {
        operation: &'static str,
        message: String,
    },

    /// Persisted data could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create an Io error with operation context.
    pub fn io(operation: &'static str, message: impl ToString) -> Self {
        Self::Io {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

/// Errors from the generative services (name proposal, image synthesis,
/// background removal). Every variant is terminal for the calling pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("No credential configured for the generative service")]
    MissingCredential,
}

/// Errors from board (live token registry) operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BoardError {
    #[error("Token not found: {0}")]
    TokenNotFound(TokenId),
    #[error(transparent)]
    Transition(#[from] DomainError),
}

impl BoardError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TokenNotFound(_))
    }
}
