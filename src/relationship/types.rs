//! Core types for the friendship graph.
//!
//! A friendship is stored as a single edge per unordered pair of users.
//! The edge records who asked first so that a pending request can only be
//! answered by the other side.

use serde::{Deserialize, Serialize};

use super::error::{RelationshipError, Result};
use crate::user::UserId;

/// Normalized key for an unordered pair of distinct users.
///
/// `PairKey::new(a, b)` and `PairKey::new(b, a)` are equal, which is what
/// makes "one edge per relationship" enforceable by a primary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PairKey {
    low: UserId,
    high: UserId,
}

impl PairKey {
    /// Builds the key for two users, in either order.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::SelfReference`] if both ids are equal.
    pub fn new(a: &UserId, b: &UserId) -> Result<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Ok(Self {
                low: a.clone(),
                high: b.clone(),
            }),
            std::cmp::Ordering::Greater => Ok(Self {
                low: b.clone(),
                high: a.clone(),
            }),
            std::cmp::Ordering::Equal => Err(RelationshipError::SelfReference(a.to_string())),
        }
    }

    /// The lexicographically smaller member of the pair.
    #[must_use]
    pub const fn low(&self) -> &UserId {
        &self.low
    }

    /// The lexicographically larger member of the pair.
    #[must_use]
    pub const fn high(&self) -> &UserId {
        &self.high
    }

    /// Returns whether `user` is one of the two members.
    #[must_use]
    pub fn contains(&self, user: &UserId) -> bool {
        &self.low == user || &self.high == user
    }

    /// Returns the member that is not `user`, if `user` belongs to the pair.
    #[must_use]
    pub fn other(&self, user: &UserId) -> Option<&UserId> {
        if &self.low == user {
            Some(&self.high)
        } else if &self.high == user {
            Some(&self.low)
        } else {
            None
        }
    }
}

/// Status of a friendship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    /// One user asked, the other has not answered yet.
    Requested,
    /// Both users are friends.
    Accepted,
}

impl FriendshipStatus {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "requested" => Some(Self::Requested),
            "accepted" => Some(Self::Accepted),
            _ => None,
        }
    }
}

/// A stored friendship edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendshipEdge {
    /// The unordered pair this edge belongs to.
    pub pair: PairKey,
    /// Current status.
    pub status: FriendshipStatus,
    /// Who sent the original request. Kept after acceptance.
    pub requester: UserId,
    /// When the request was sent (Unix timestamp).
    pub requested_at: i64,
    /// When the request was accepted (Unix timestamp).
    pub responded_at: Option<i64>,
}

impl FriendshipEdge {
    /// Creates a fresh pending request from `requester` to `requestee`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::SelfReference`] if both ids are equal.
    pub fn request(requester: &UserId, requestee: &UserId, now: i64) -> Result<Self> {
        Ok(Self {
            pair: PairKey::new(requester, requestee)?,
            status: FriendshipStatus::Requested,
            requester: requester.clone(),
            requested_at: now,
            responded_at: None,
        })
    }

    /// Returns a copy of this edge in the accepted state.
    #[must_use]
    pub fn accepted(&self, now: i64) -> Self {
        Self {
            status: FriendshipStatus::Accepted,
            responded_at: Some(now),
            ..self.clone()
        }
    }

    /// Returns whether this edge is a pending request sent by `user`.
    #[must_use]
    pub fn is_pending_from(&self, user: &UserId) -> bool {
        self.status == FriendshipStatus::Requested && &self.requester == user
    }

    /// Returns whether this edge is an accepted friendship.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status == FriendshipStatus::Accepted
    }

    /// The user the pending request is addressed to.
    #[must_use]
    pub fn requestee(&self) -> Option<&UserId> {
        self.pair.other(&self.requester)
    }
}

/// Non-error result of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// A new pending request was created.
    Requested,
    /// The other user had already asked, so the pair are now friends.
    AutoAccepted,
    /// The same request is already waiting for an answer.
    AlreadyPending,
    /// The users are already friends.
    AlreadyFriends,
}

impl RequestOutcome {
    /// Returns whether the pair are friends after this outcome.
    #[must_use]
    pub const fn is_friends(&self) -> bool {
        matches!(self, Self::AutoAccepted | Self::AlreadyFriends)
    }
}

/// Relationship between two users as seen from one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FriendshipState {
    /// No edge exists.
    None,
    /// The viewer sent a request that is still pending.
    RequestSent,
    /// The other user sent a request the viewer has not answered.
    RequestReceived,
    /// The users are friends.
    Friends,
}

/// Write applied to a pair's edge inside a store transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeChange {
    /// Leave the stored edge as it is.
    Unchanged,
    /// Insert or replace the edge.
    Write(FriendshipEdge),
    /// Remove the edge.
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> UserId {
        UserId::from(s)
    }

    #[test]
    fn pair_key_is_order_independent() {
        let ab = PairKey::new(&id("alice"), &id("bob")).unwrap();
        let ba = PairKey::new(&id("bob"), &id("alice")).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.low(), &id("alice"));
        assert_eq!(ab.high(), &id("bob"));
    }

    #[test]
    fn pair_key_rejects_self() {
        let result = PairKey::new(&id("alice"), &id("alice"));
        assert!(matches!(result, Err(RelationshipError::SelfReference(_))));
    }

    #[test]
    fn pair_key_other_member() {
        let pair = PairKey::new(&id("alice"), &id("bob")).unwrap();
        assert_eq!(pair.other(&id("alice")), Some(&id("bob")));
        assert_eq!(pair.other(&id("bob")), Some(&id("alice")));
        assert_eq!(pair.other(&id("carol")), None);
        assert!(pair.contains(&id("bob")));
        assert!(!pair.contains(&id("carol")));
    }

    #[test]
    fn status_round_trips_through_storage_string() {
        for status in [FriendshipStatus::Requested, FriendshipStatus::Accepted] {
            assert_eq!(FriendshipStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FriendshipStatus::parse("request"), None);
    }

    #[test]
    fn request_edge_points_at_requestee() {
        let edge = FriendshipEdge::request(&id("bob"), &id("alice"), 10).unwrap();
        assert_eq!(edge.status, FriendshipStatus::Requested);
        assert_eq!(edge.requestee(), Some(&id("alice")));
        assert!(edge.is_pending_from(&id("bob")));
        assert!(!edge.is_pending_from(&id("alice")));
        assert!(edge.responded_at.is_none());
    }

    #[test]
    fn accepted_edge_keeps_request_metadata() {
        let edge = FriendshipEdge::request(&id("bob"), &id("alice"), 10).unwrap();
        let accepted = edge.accepted(20);
        assert!(accepted.is_accepted());
        assert_eq!(accepted.requester, id("bob"));
        assert_eq!(accepted.requested_at, 10);
        assert_eq!(accepted.responded_at, Some(20));
        assert!(!accepted.is_pending_from(&id("bob")));
    }

    #[test]
    fn outcome_friendship_flag() {
        assert!(RequestOutcome::AutoAccepted.is_friends());
        assert!(RequestOutcome::AlreadyFriends.is_friends());
        assert!(!RequestOutcome::Requested.is_friends());
        assert!(!RequestOutcome::AlreadyPending.is_friends());
    }
}
