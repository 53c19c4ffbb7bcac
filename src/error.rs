//! Error type for the [`PhotoShareCore`](crate::PhotoShareCore) facade.

use thiserror::Error;

use crate::access::AccessError;
use crate::content::ContentError;
use crate::relationship::RelationshipError;
use crate::user::UserError;

/// Error type for facade operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Setting up the data directories failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// User registration or lookup failed.
    #[error(transparent)]
    User(#[from] UserError),

    /// A friendship operation failed.
    #[error(transparent)]
    Relationship(#[from] RelationshipError),

    /// A content operation failed.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// An authorization check failed or denied access.
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl CoreError {
    /// Shorthand for a denied authorization check.
    #[must_use]
    pub const fn access_denied() -> Self {
        Self::Access(AccessError::AccessDenied)
    }

    /// Returns whether the viewer was refused.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::Access(AccessError::AccessDenied))
    }

    /// Returns whether this error came from the persistence layer.
    #[must_use]
    pub fn is_storage_failure(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Storage(_) => true,
            Self::User(e) => matches!(e, UserError::Storage(_) | UserError::Database(_)),
            Self::Relationship(e) => e.is_storage_failure(),
            Self::Content(e) => e.is_storage_failure(),
            Self::Access(e) => e.is_storage_failure(),
        }
    }
}

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_helpers_agree() {
        let err = CoreError::access_denied();
        assert!(err.is_access_denied());
        assert!(!err.is_storage_failure());
        assert_eq!(err.to_string(), "Access denied");
    }

    #[test]
    fn wrapped_errors_are_transparent() {
        let err: CoreError = RelationshipError::UnknownUser("zed".to_string()).into();
        assert_eq!(err.to_string(), "User not found: zed");
        assert!(!err.is_access_denied());
    }

    #[test]
    fn storage_failures_are_classified() {
        assert!(CoreError::Storage("disk".to_string()).is_storage_failure());
        assert!(CoreError::from(UserError::Storage("lock".to_string())).is_storage_failure());
        assert!(!CoreError::from(UserError::InvalidData("x".to_string())).is_storage_failure());
        assert!(!CoreError::Config("bad".to_string()).is_storage_failure());
    }
}
