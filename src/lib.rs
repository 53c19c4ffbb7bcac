//! Photoshare Core Library
//!
//! Friendships and album access control for a small photo-sharing site.
//!
//! Users ask each other to be friends; once a request is accepted the two
//! can see each other's shared albums, along with the pictures and comments
//! inside them. Private albums are only ever visible to their owner.
//!
//! - [`relationship`]: the friend-request state machine
//! - [`access`]: who may see which album, picture or comment
//! - [`content`]: album, picture and comment storage plus upload files
//! - [`user`]: user ids and the registered-user directory
//! - [`PhotoShareCore`]: the facade page handlers call

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod access;
mod api;
pub mod config;
pub mod content;
mod db;
mod error;
pub mod relationship;
pub mod user;

pub use api::{FriendSummary, PendingRequest, PhotoShareCore};
pub use error::{CoreError, Result};
