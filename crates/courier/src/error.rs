//! Courier error types.

use thiserror::Error;

/// Errors that can occur when looking up shipping rates.
#[derive(Debug, Error)]
pub enum CourierError {
    /// The query was incomplete; nothing was sent upstream.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request could not be sent or the response could not be decoded.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The rate provider answered with a non-success status.
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The provider is unreachable or switched off.
    #[error("Courier service unavailable: {0}")]
    Unavailable(String),
}

/// Result type for courier operations.
pub type Result<T> = std::result::Result<T, CourierError>;
