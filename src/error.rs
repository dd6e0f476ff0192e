//! Failure taxonomy shared by every pipeline stage.

use thiserror::Error;

/// Errors produced while embedding, ranking, assembling, or generating.
///
/// `answer()` collapses all of these into one of two user-facing strings; the
/// variants exist so each stage can log what actually went wrong.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RagError {
    /// Caller-supplied data was malformed (empty query, zero top-k, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Provider {
        /// HTTP status code reported by the provider.
        status: u16,
        /// Response body, or a placeholder when it could not be read.
        body: String,
    },
    /// The provider could not be reached, timed out, or sent an unreadable body.
    #[error("provider transport failure: {0}")]
    Transport(String),
    /// The generation provider answered successfully but with no usable text.
    #[error("provider returned empty content")]
    EmptyCompletion,
    /// A vector was malformed, non-finite, or of the wrong dimension.
    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),
    /// A stored vector does not match the query vector's length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the query vector.
        expected: usize,
        /// Length of the offending candidate vector.
        actual: usize,
    },
    /// Nothing relevant survived ranking and filtering.
    #[error("no relevant context")]
    NoContext,
    /// The storage collaborator failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl RagError {
    /// True for the non-error "nothing matched" terminal state.
    pub fn is_no_context(&self) -> bool {
        matches!(self, RagError::NoContext)
    }

    /// Short, stable label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::InvalidInput(_) => "invalid_input",
            RagError::Provider { .. } => "provider_error",
            RagError::Transport(_) => "transport_error",
            RagError::EmptyCompletion => "empty_completion",
            RagError::InvalidEmbedding(_) => "invalid_embedding",
            RagError::DimensionMismatch { .. } => "dimension_mismatch",
            RagError::NoContext => "no_context",
            RagError::Storage(_) => "storage_error",
        }
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Transport(err.to_string())
    }
}

impl From<tokio_postgres::Error> for RagError {
    fn from(err: tokio_postgres::Error) -> Self {
        RagError::Storage(err.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = RagError> = std::result::Result<T, E>;
