use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An entity with the same key (or an equivalent unique constraint)
    /// already exists.
    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// The entity to update was not found.
    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
