//! Error types for Arquivista.

use thiserror::Error;

/// Common error type for Arquivista.
#[derive(Error, Debug)]
pub enum ArquivistaError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input (disallowed type, bad field value).
    #[error("validation error: {0}")]
    Validation(String),

    /// No file was selected in an upload.
    #[error("no file selected")]
    EmptySelection,

    /// Upload batch exceeded the per-request file limit.
    #[error("too many files in one upload: {count} (limit: {limit})")]
    BatchTooLarge {
        /// Number of entries in the rejected batch.
        count: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A user-supplied path resolved outside the account root.
    #[error("path escapes the storage root: {0}")]
    PathTraversal(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A unique record already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for ArquivistaError {
    fn from(e: sqlx::Error) -> Self {
        ArquivistaError::Database(e.to_string())
    }
}

/// Result type alias for Arquivista operations.
pub type Result<T> = std::result::Result<T, ArquivistaError>;
