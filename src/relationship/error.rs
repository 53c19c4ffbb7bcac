//! Error types for friendship operations.
//!
//! Validation failures (`SelfReference`, `UnknownUser`, `InvalidData`) are
//! detected before anything is written. Storage failures are surfaced as-is
//! and never retried here.

use thiserror::Error;

use crate::user::UserError;

/// Error type for friendship operations.
#[derive(Error, Debug)]
pub enum RelationshipError {
    /// A user tried to befriend themselves.
    #[error("Cannot send a friend request to yourself: {0}")]
    SelfReference(String),

    /// The target user does not exist.
    #[error("User not found: {0}")]
    UnknownUser(String),

    /// The edge is not in a state that allows the operation.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Invalid data provided.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl RelationshipError {
    /// Returns whether this error came from the persistence layer.
    #[must_use]
    pub const fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Database(_))
    }
}

/// Result type alias for friendship operations.
pub type Result<T> = std::result::Result<T, RelationshipError>;

impl From<UserError> for RelationshipError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidData(msg) => Self::InvalidData(msg),
            err @ UserError::AlreadyExists(_) => Self::InvalidData(err.to_string()),
            UserError::Database(e) => Self::Database(e),
            UserError::Storage(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_reference_error_display() {
        let err = RelationshipError::SelfReference("alice".to_string());
        assert_eq!(
            err.to_string(),
            "Cannot send a friend request to yourself: alice"
        );
    }

    #[test]
    fn unknown_user_error_display() {
        let err = RelationshipError::UnknownUser("ghost".to_string());
        assert_eq!(err.to_string(), "User not found: ghost");
    }

    #[test]
    fn invalid_transition_error_display() {
        let err = RelationshipError::InvalidTransition("no pending request".to_string());
        assert_eq!(err.to_string(), "Invalid transition: no pending request");
    }

    #[test]
    fn storage_failures_are_classified() {
        assert!(RelationshipError::Storage("lock".to_string()).is_storage_failure());
        assert!(
            RelationshipError::Database(rusqlite::Error::QueryReturnedNoRows).is_storage_failure()
        );
        assert!(!RelationshipError::UnknownUser("x".to_string()).is_storage_failure());
    }

    #[test]
    fn user_invalid_data_stays_a_validation_error() {
        let err: RelationshipError = UserError::InvalidData("User ID is required".into()).into();
        assert!(matches!(err, RelationshipError::InvalidData(_)));
    }

    #[test]
    fn duplicate_user_is_not_a_storage_failure() {
        let err: RelationshipError = UserError::AlreadyExists("alice".into()).into();
        assert!(matches!(err, RelationshipError::InvalidData(_)));
        assert!(!err.is_storage_failure());
    }

    #[test]
    fn user_storage_error_becomes_storage_failure() {
        let err: RelationshipError = UserError::Storage("poisoned".into()).into();
        assert!(err.is_storage_failure());
    }
}
