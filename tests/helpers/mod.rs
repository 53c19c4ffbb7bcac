//! Reusable helpers for integration tests.
//!
//! Sites are file-backed in a temporary directory so the tests exercise the
//! same `SQLite` setup as production.

#![allow(dead_code)]

use photoshare_core::config::CoreConfig;
use photoshare_core::content::{Accessibility, Album, NewAlbum, NewPicture, Picture};
use photoshare_core::user::{AuthenticatedUser, UserId};
use photoshare_core::PhotoShareCore;
use tempfile::TempDir;

/// A core opened on a fresh data directory.
///
/// The directory lives as long as this value.
pub struct TestSite {
    pub dir: TempDir,
    pub core: PhotoShareCore,
}

impl TestSite {
    /// Opens a site and registers each `(id, name)` user.
    pub fn with_users(users: &[&str]) -> Self {
        init_logging();
        let dir = tempfile::tempdir().expect("should create temp dir");
        let core = PhotoShareCore::open(&config_for(&dir)).expect("should open core");
        for id in users {
            core.register_user(id, &display_name(id))
                .expect("should register user");
        }
        Self { dir, core }
    }

    /// Opens a second core on the same data directory.
    pub fn reopen(&self) -> PhotoShareCore {
        PhotoShareCore::open(&config_for(&self.dir)).expect("should reopen core")
    }

    /// Makes `a` and `b` friends through the request flow.
    pub fn befriend(&self, a: &str, b: &str) {
        self.core
            .send_friend_request(&as_user(a), b)
            .expect("should send request");
        self.core
            .accept_requests(&as_user(b), &[id(a)])
            .expect("should accept request");
    }

    /// Creates an album for `owner` with the given accessibility.
    pub fn album(&self, owner: &str, title: &str, accessibility: Accessibility) -> Album {
        self.core
            .create_album(
                &as_user(owner),
                &NewAlbum::new(title).with_accessibility(accessibility),
            )
            .expect("should create album")
    }

    /// Uploads a small picture file into `album`.
    pub fn picture(&self, owner: &str, album: &Album, file_name: &str) -> Picture {
        self.core
            .upload_picture(
                &as_user(owner),
                album.id,
                &NewPicture::new(file_name),
                file_name.as_bytes(),
            )
            .expect("should upload picture")
    }
}

pub fn config_for(dir: &TempDir) -> CoreConfig {
    CoreConfig::new(dir.path()).with_busy_timeout_ms(10_000)
}

pub fn id(s: &str) -> UserId {
    UserId::from(s)
}

pub fn as_user(s: &str) -> AuthenticatedUser {
    AuthenticatedUser(id(s))
}

fn display_name(id: &str) -> String {
    let mut chars = id.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
