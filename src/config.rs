//! Configuration for [`PhotoShareCore`](crate::PhotoShareCore).
//!
//! Usually loaded from a JSON file; every field has a default.
//!
//! ```
//! use photoshare_core::config::CoreConfig;
//!
//! let config = CoreConfig::from_json_str(r#"{ "data_dir": "/srv/photos" }"#).unwrap();
//! assert!(config.database_path().ends_with("photoshare.db"));
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Settings for opening the core on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Directory holding the database and, by default, the uploads.
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`.
    pub database_file: String,
    /// Uploads directory; relative paths resolve against `data_dir`.
    pub uploads_dir: PathBuf,
    /// How long a writer waits for the database write lock, in
    /// milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database_file: "photoshare.db".to_string(),
            uploads_dir: PathBuf::from("uploads"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl CoreConfig {
    /// Creates a configuration rooted at `data_dir` with default settings.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the database file name.
    #[must_use]
    pub fn with_database_file(mut self, name: impl Into<String>) -> Self {
        self.database_file = name.into();
        self
    }

    /// Sets the uploads directory.
    #[must_use]
    pub fn with_uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = dir.into();
        self
    }

    /// Sets the write-lock wait in milliseconds.
    #[must_use]
    pub const fn with_busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = millis;
        self
    }

    /// Parses a configuration from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the JSON is malformed or the result
    /// fails validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Checks the settings that cannot be expressed by types alone.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for an empty or path-like database
    /// file name.
    pub fn validate(&self) -> Result<()> {
        let name = self.database_file.trim();
        if name.is_empty() {
            return Err(CoreError::Config("database_file must not be empty".to_string()));
        }
        if name.contains(['/', '\\']) {
            return Err(CoreError::Config(format!(
                "database_file must be a plain file name: {name}"
            )));
        }
        Ok(())
    }

    /// Full path of the database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Full path of the uploads directory.
    #[must_use]
    pub fn uploads_path(&self) -> PathBuf {
        if self.uploads_dir.is_absolute() {
            self.uploads_dir.clone()
        } else {
            self.data_dir.join(&self.uploads_dir)
        }
    }

    /// Write-lock wait as a [`Duration`].
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
