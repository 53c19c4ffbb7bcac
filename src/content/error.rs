//! Error types for content operations.

use thiserror::Error;

/// Error type for album, picture and comment operations.
#[derive(Error, Debug)]
pub enum ContentError {
    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system error in the uploads directory.
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Content not found, or not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data provided.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl ContentError {
    /// Returns whether this error came from the persistence layer.
    #[must_use]
    pub const fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Database(_) | Self::Io(_))
    }
}

/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, ContentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error_display() {
        let err = ContentError::NotFound("album 4".to_string());
        assert_eq!(err.to_string(), "Not found: album 4");
    }

    #[test]
    fn invalid_data_error_display() {
        let err = ContentError::InvalidData("Title is required".to_string());
        assert_eq!(err.to_string(), "Invalid data: Title is required");
    }

    #[test]
    fn io_errors_are_storage_failures() {
        let err: ContentError = std::io::Error::other("disk full").into();
        assert!(err.is_storage_failure());
        assert!(!ContentError::NotFound("x".into()).is_storage_failure());
    }
}
