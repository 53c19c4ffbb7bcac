//! Access control for albums and their contents.
//!
//! Visibility is owner-or-friend-of-owner-and-shared. There is no
//! per-friend allow list and no accessibility tier below the album.

mod error;
mod service;

pub use error::{AccessError, Result};
pub use service::{AccessControlService, ViewTarget};
