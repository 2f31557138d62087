use thiserror::Error;

/// Failure reported by an embedding backend. Never retried inside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{service} is not configured: {reason}")]
    NotConfigured { service: String, reason: String },

    #[error("{service} returned HTTP {status}")]
    Status { service: String, status: u16 },

    #[error("{service} request failed: {message}")]
    Transport { service: String, message: String },

    #[error("invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },
}

/// Why an embedding lookup or a ranking call failed.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The embedding service failed; carried through unchanged.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Two vectors being compared have different lengths.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
