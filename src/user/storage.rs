//! `SQLite` storage for registered users.
//!
//! Only the identifier and display name are kept here. Credentials live
//! with the authentication layer and never reach this crate.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use super::error::{Result, UserError};
use super::types::{User, UserId};
use super::UserDirectory;
use crate::db;

/// `SQLite`-based storage for users.
pub struct UserStorage {
    conn: Mutex<Connection>,
}

impl UserStorage {
    /// Creates a new storage instance at the given path.
    ///
    /// Creates the database file and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        Self::open(path, db::DEFAULT_BUSY_TIMEOUT)
    }

    /// Creates a storage instance with an explicit write-lock timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(db::open(path, busy_timeout)?),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(db::open_in_memory()?),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| UserError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::AlreadyExists`] if the identifier is taken,
    /// [`UserError::InvalidData`] if the name is blank, or a storage error.
    pub fn create_user(&self, id: &UserId, name: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UserError::InvalidData("Name is required".to_string()));
        }

        let user = User {
            id: id.clone(),
            name: name.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };

        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO users (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![user.id.as_str(), &user.name, user.created_at],
        ) {
            Ok(_) => {
                log::info!("registered user {}", user.id);
                Ok(user)
            }
            Err(e) if db::is_constraint_violation(&e) => {
                Err(UserError::AlreadyExists(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Retrieves a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, name, created_at FROM users WHERE user_id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(User {
                        id: UserId::from(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Retrieves the users with the given identifiers, skipping unknown ones.
    ///
    /// Results keep the order of `ids`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT user_id, name, created_at FROM users WHERE user_id = ?1")?;

        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            let user = stmt
                .query_row(params![id.as_str()], |row| {
                    Ok(User {
                        id: UserId::from(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })
                .optional()?;
            if let Some(user) = user {
                users.push(user);
            }
        }
        Ok(users)
    }
}

impl UserDirectory for UserStorage {
    fn find_user(&self, id: &UserId) -> Result<Option<User>> {
        self.get_user(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_get_user() {
        let storage = UserStorage::in_memory().unwrap();
        let id = UserId::from("alice");

        let created = storage.create_user(&id, "Alice").unwrap();
        let retrieved = storage.get_user(&id).unwrap().unwrap();

        assert_eq!(retrieved, created);
        assert_eq!(retrieved.name, "Alice");
    }

    #[test]
    fn get_nonexistent_user_returns_none() {
        let storage = UserStorage::in_memory().unwrap();
        assert!(storage.get_user(&UserId::from("ghost")).unwrap().is_none());
    }

    #[test]
    fn duplicate_user_is_rejected() {
        let storage = UserStorage::in_memory().unwrap();
        let id = UserId::from("alice");

        storage.create_user(&id, "Alice").unwrap();
        let result = storage.create_user(&id, "Another Alice");

        assert!(matches!(result, Err(UserError::AlreadyExists(ref s)) if s == "alice"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let storage = UserStorage::in_memory().unwrap();
        let result = storage.create_user(&UserId::from("alice"), "  ");
        assert!(matches!(result, Err(UserError::InvalidData(_))));
    }

    #[test]
    fn get_users_skips_unknown_and_keeps_order() {
        let storage = UserStorage::in_memory().unwrap();
        storage.create_user(&UserId::from("bob"), "Bob").unwrap();
        storage.create_user(&UserId::from("alice"), "Alice").unwrap();

        let users = storage
            .get_users(&[
                UserId::from("bob"),
                UserId::from("ghost"),
                UserId::from("alice"),
            ])
            .unwrap();

        let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[test]
    fn directory_reports_existence() {
        let storage = UserStorage::in_memory().unwrap();
        storage.create_user(&UserId::from("alice"), "Alice").unwrap();

        assert!(storage.user_exists(&UserId::from("alice")).unwrap());
        assert!(!storage.user_exists(&UserId::from("bob")).unwrap());
    }
}
