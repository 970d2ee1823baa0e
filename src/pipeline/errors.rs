//! Pipeline errors
//!
//! Classified where they arise: validation failures and unknown ids are
//! typed here, everything from the store stays an opaque storage failure.

use thiserror::Error;

use crate::storage::StorageError;
use crate::validation::ValidationErrors;

/// Result type for pipeline and query operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The submission broke one or more input rules
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),

    /// No submission with the requested id
    #[error("Contact not found.")]
    NotFound,

    /// The store failed; fatal to the request, never retried
    #[error(transparent)]
    Storage(#[from] StorageError),
}
