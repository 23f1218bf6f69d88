//! Error types for the embedding pipeline.

use thiserror::Error;

/// Errors that can occur while computing an embedding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LleError {
    /// Arguments rejected before any computation started
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The local weight system of a point could not be solved
    #[error("reconstruction failed for point {point}: {reason}")]
    ReconstructionFailure { point: usize, reason: String },

    /// The eigensolver did not converge on the cost matrix
    #[error("eigendecomposition of the {size}x{size} cost matrix did not converge")]
    DecompositionFailure { size: usize },
}

impl LleError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        LleError::InvalidArgument(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, LleError>;
