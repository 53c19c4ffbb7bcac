//! Error types for authorization checks.

use thiserror::Error;

use crate::content::ContentError;
use crate::relationship::RelationshipError;

/// Error type for authorization checks.
#[derive(Error, Debug)]
pub enum AccessError {
    /// The viewer may not see the target.
    ///
    /// Deliberately carries no identifiers: a missing target and a hidden
    /// one produce the same error.
    #[error("Access denied")]
    AccessDenied,

    /// Friendship lookup failed.
    #[error(transparent)]
    Relationship(#[from] RelationshipError),

    /// Content lookup failed.
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl AccessError {
    /// Returns whether this error came from the persistence layer.
    #[must_use]
    pub const fn is_storage_failure(&self) -> bool {
        match self {
            Self::AccessDenied => false,
            Self::Relationship(e) => e.is_storage_failure(),
            Self::Content(e) => e.is_storage_failure(),
        }
    }
}

/// Result type alias for authorization checks.
pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_display_is_generic() {
        assert_eq!(AccessError::AccessDenied.to_string(), "Access denied");
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err: AccessError = RelationshipError::Storage("lock".to_string()).into();
        assert_eq!(err.to_string(), "Storage error: lock");
        assert!(err.is_storage_failure());
    }

    #[test]
    fn denial_is_not_a_storage_failure() {
        assert!(!AccessError::AccessDenied.is_storage_failure());
        let err: AccessError = ContentError::NotFound("album 1".to_string()).into();
        assert!(!err.is_storage_failure());
    }
}
