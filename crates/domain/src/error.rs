//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::order::PartialFailure;

/// Errors that can occur during domain operations.
///
/// Validation and authentication failures are raised before any write, so
/// they never leave side effects behind.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid credential.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated, but not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The persistence gateway failed.
    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// The order exists but one or more of its lines could not be created.
    #[error(transparent)]
    PartialFailure(#[from] PartialFailure),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => DomainError::NotFound {
                entity,
                id: id.to_string(),
            },
            other => DomainError::Storage(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
