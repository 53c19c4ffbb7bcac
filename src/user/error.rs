//! Error types for user directory operations.

use thiserror::Error;

/// Error type for user operations.
#[derive(Error, Debug)]
pub enum UserError {
    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data provided.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A user with this identifier already exists.
    #[error("User already exists: {0}")]
    AlreadyExists(String),
}

/// Result type alias for user operations.
pub type Result<T> = std::result::Result<T, UserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_data_error_display() {
        let err = UserError::InvalidData("User ID is required".to_string());
        assert_eq!(err.to_string(), "Invalid data: User ID is required");
    }

    #[test]
    fn already_exists_error_display() {
        let err = UserError::AlreadyExists("alice".to_string());
        assert_eq!(err.to_string(), "User already exists: alice");
    }
}
