use thiserror::Error;

/// Errors that can occur when interacting with the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the requested identifier.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A write referenced a row that does not exist.
    #[error("Referenced {entity} does not exist: {id}")]
    MissingReference { entity: &'static str, id: i64 },

    /// A unique key is already taken.
    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// The row is still referenced and cannot be removed.
    #[error("{entity} {id} is still referenced")]
    InUse { entity: &'static str, id: i64 },

    /// The backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if the error means "no such row".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, StoreError>;
