//! User identity types.
//!
//! Users are created and authenticated outside this crate. The core only
//! needs a stable identifier and a display name.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::{Result, UserError};

/// Externally assigned, unique user identifier.
///
/// Identifiers are compared exactly. Surrounding whitespace is stripped
/// when parsing so that `" alice "` and `"alice"` name the same user.
/// Deserialization goes through [`UserId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parses a user identifier from raw input.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidData`] if the input is blank.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserError::InvalidData("User ID is required".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    /// Wraps an identifier that is already known to be valid, such as one
    /// read back from storage.
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Display name shown to friends.
    pub name: String,
    /// When the user registered (Unix timestamp).
    pub created_at: i64,
}

/// Supplies the authenticated user for a request.
///
/// Implemented by the session layer of the embedding application. Every
/// core operation receives the resulting [`UserId`] as an argument; nothing
/// in this crate reads identity from ambient state.
pub trait Identity {
    /// Returns the identifier of the already-authenticated user.
    fn current_user(&self) -> UserId;
}

/// An identity that has already been resolved by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl Identity for AuthenticatedUser {
    fn current_user(&self) -> UserId {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let id = UserId::parse("  alice \n").unwrap();
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn parse_rejects_blank_input() {
        assert!(matches!(UserId::parse(""), Err(UserError::InvalidData(_))));
        assert!(matches!(UserId::parse("   "), Err(UserError::InvalidData(_))));
    }

    #[test]
    fn ids_are_case_sensitive() {
        assert_ne!(UserId::from("Alice"), UserId::from("alice"));
    }

    #[test]
    fn display_matches_inner_value() {
        assert_eq!(UserId::from("bob").to_string(), "bob");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::from("carol")).unwrap();
        assert_eq!(json, "\"carol\"");
    }

    #[test]
    fn deserialize_trims_and_rejects_blank() {
        let id: UserId = serde_json::from_str("\" erin \"").unwrap();
        assert_eq!(id.as_str(), "erin");
        assert!(serde_json::from_str::<UserId>("\"   \"").is_err());
        assert!(serde_json::from_str::<User>(r#"{"id":"","name":"x","created_at":0}"#).is_err());
    }

    #[test]
    fn authenticated_user_reports_its_id() {
        let identity = AuthenticatedUser(UserId::from("dave"));
        assert_eq!(identity.current_user(), UserId::from("dave"));
    }
}
