//! Friendships between users.
//!
//! Friendship is symmetric, but it starts with a one-directional request.
//! The graph stores exactly one edge per unordered pair of users.
//!
//! # Architecture
//!
//! ```text
//! RelationshipService (state machine)
//!     ├── RelationshipStore (SQLite edges, one per pair)
//!     └── UserDirectory (rejects requests to unknown users)
//! ```
//!
//! # Types
//!
//! - [`PairKey`]: normalized unordered pair of user ids
//! - [`FriendshipEdge`]: the stored edge with status and requester
//! - [`RequestOutcome`]: non-error results of a friend request
//! - [`FriendshipState`]: the relationship as seen by one user

mod error;
mod service;
mod storage;
pub mod types;

pub use error::{RelationshipError, Result};
pub use service::RelationshipService;
pub use storage::RelationshipStore;
pub use types::{
    EdgeChange, FriendshipEdge, FriendshipState, FriendshipStatus, PairKey, RequestOutcome,
};
