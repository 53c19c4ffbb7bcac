//! Users and the identity boundary.
//!
//! Authentication happens outside this crate. What remains here is the
//! typed [`UserId`], the [`UserDirectory`] lookup the friendship flow uses
//! to reject requests to unknown users, and a `SQLite` implementation of it.

mod error;
mod storage;
mod types;

pub use error::{Result, UserError};
pub use storage::UserStorage;
pub use types::{AuthenticatedUser, Identity, User, UserId};

/// Read-only view of registered users.
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn find_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Returns whether a user with this identifier exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn user_exists(&self, id: &UserId) -> Result<bool> {
        Ok(self.find_user(id)?.is_some())
    }
}
