//! Friend-request state machine.
//!
//! Per unordered pair of users:
//!
//! ```text
//! NONE --request--> REQUESTED --accept / counter-request--> ACCEPTED
//!                       |                                       |
//!                       +--deny--> NONE          NONE <--remove--+
//! ```
//!
//! Each transition is decided by a pure function over the current edge and
//! applied through [`RelationshipStore::apply`], so the decision and the
//! write happen under the same database write lock.

use std::sync::Arc;

use super::error::{RelationshipError, Result};
use super::storage::RelationshipStore;
use super::types::{EdgeChange, FriendshipEdge, FriendshipState, PairKey, RequestOutcome};
use crate::user::{UserDirectory, UserId};

/// High-level API for friendships.
///
/// # Example
///
/// ```ignore
/// let service = RelationshipService::new(store, users);
/// service.request_friend(&alice, &bob)?;
/// service.accept_request(&bob, &alice)?;
/// assert!(service.are_friends(&alice, &bob)?);
/// ```
pub struct RelationshipService {
    store: RelationshipStore,
    users: Arc<dyn UserDirectory>,
}

impl RelationshipService {
    /// Creates a service over the given edge store and user directory.
    #[must_use]
    pub fn new(store: RelationshipStore, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    /// Returns the underlying edge store.
    #[must_use]
    pub const fn store(&self) -> &RelationshipStore {
        &self.store
    }

    // ==================== Transitions ====================

    /// Sends a friend request from `requester` to `requestee`.
    ///
    /// If `requestee` already asked `requester`, the pair become friends
    /// immediately. Repeating a pending request or befriending an existing
    /// friend changes nothing and is reported through [`RequestOutcome`].
    ///
    /// # Errors
    ///
    /// - [`RelationshipError::SelfReference`] if both ids are equal.
    /// - [`RelationshipError::UnknownUser`] if `requestee` does not exist.
    /// - A storage error if the lookup or write fails.
    pub fn request_friend(&self, requester: &UserId, requestee: &UserId) -> Result<RequestOutcome> {
        let pair = PairKey::new(requester, requestee)?;

        if !self.users.user_exists(requestee)? {
            return Err(RelationshipError::UnknownUser(requestee.to_string()));
        }

        let now = chrono::Utc::now().timestamp();
        let outcome = self.store.apply(&pair, |current| {
            decide_request(current, requester, requestee, now)
        })?;

        match outcome {
            RequestOutcome::Requested => {
                log::info!("{requester} sent a friend request to {requestee}");
            }
            RequestOutcome::AutoAccepted => {
                log::info!("{requester} and {requestee} are now friends (counter-request)");
            }
            RequestOutcome::AlreadyPending | RequestOutcome::AlreadyFriends => {
                log::debug!("friend request {requester} -> {requestee}: {outcome:?}");
            }
        }

        Ok(outcome)
    }

    /// Accepts the pending request `requester` sent to `user`.
    ///
    /// Returns the accepted edge.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::InvalidTransition`] unless `requester`
    /// has a pending request addressed to `user`.
    pub fn accept_request(&self, user: &UserId, requester: &UserId) -> Result<FriendshipEdge> {
        let pair = response_pair(user, requester)?;
        let now = chrono::Utc::now().timestamp();

        let edge = self
            .store
            .apply(&pair, |current| decide_accept(current, user, requester, now))?;

        log::info!("{user} accepted the friend request from {requester}");
        Ok(edge)
    }

    /// Denies the pending request `requester` sent to `user`.
    ///
    /// The edge is deleted, so `requester` may ask again later.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::InvalidTransition`] unless `requester`
    /// has a pending request addressed to `user`.
    pub fn deny_request(&self, user: &UserId, requester: &UserId) -> Result<()> {
        let pair = response_pair(user, requester)?;

        self.store
            .apply(&pair, |current| decide_deny(current, user, requester))?;

        log::info!("{user} denied the friend request from {requester}");
        Ok(())
    }

    /// Ends the friendship between two users.
    ///
    /// Returns whether a friendship was removed. Pairs that are not friends,
    /// including pairs with a pending request, are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn remove_friendship(&self, a: &UserId, b: &UserId) -> Result<bool> {
        let Ok(pair) = PairKey::new(a, b) else {
            return Ok(false);
        };

        let removed = self
            .store
            .apply(&pair, |current| Ok(decide_remove(current)))?;

        if removed {
            log::info!("{a} and {b} are no longer friends");
        } else {
            log::debug!("remove friendship {a} <-> {b}: not friends, nothing to do");
        }
        Ok(removed)
    }

    // ==================== Queries ====================

    /// Returns whether the two users are friends. Symmetric in its arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn are_friends(&self, a: &UserId, b: &UserId) -> Result<bool> {
        let Ok(pair) = PairKey::new(a, b) else {
            return Ok(false);
        };
        Ok(self
            .store
            .find_edge(&pair)?
            .is_some_and(|edge| edge.is_accepted()))
    }

    /// Returns the users with a pending request addressed to `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn pending_requests_for(&self, user: &UserId) -> Result<Vec<UserId>> {
        self.store.list_pending_incoming(user)
    }

    /// Returns the users `user` has asked who have not answered yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn outgoing_requests(&self, user: &UserId) -> Result<Vec<UserId>> {
        self.store.list_pending_outgoing(user)
    }

    /// Returns the friends of `user`, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn friends_of(&self, user: &UserId) -> Result<Vec<UserId>> {
        self.store.list_accepted(user)
    }

    /// Describes the relationship with `other` from `viewer`'s side.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn friendship_state(&self, viewer: &UserId, other: &UserId) -> Result<FriendshipState> {
        let Ok(pair) = PairKey::new(viewer, other) else {
            return Ok(FriendshipState::None);
        };
        Ok(match self.store.find_edge(&pair)? {
            None => FriendshipState::None,
            Some(edge) if edge.is_accepted() => FriendshipState::Friends,
            Some(edge) if &edge.requester == viewer => FriendshipState::RequestSent,
            Some(_) => FriendshipState::RequestReceived,
        })
    }
}

/// Pair for answering a request. Answering yourself is not a transition.
fn response_pair(user: &UserId, requester: &UserId) -> Result<PairKey> {
    PairKey::new(user, requester).map_err(|_| {
        RelationshipError::InvalidTransition(format!("No pending request from {requester}"))
    })
}

fn decide_request(
    current: Option<&FriendshipEdge>,
    requester: &UserId,
    requestee: &UserId,
    now: i64,
) -> Result<(EdgeChange, RequestOutcome)> {
    Ok(match current {
        None => (
            EdgeChange::Write(FriendshipEdge::request(requester, requestee, now)?),
            RequestOutcome::Requested,
        ),
        Some(edge) if edge.is_accepted() => (EdgeChange::Unchanged, RequestOutcome::AlreadyFriends),
        Some(edge) if edge.is_pending_from(requestee) => (
            EdgeChange::Write(edge.accepted(now)),
            RequestOutcome::AutoAccepted,
        ),
        Some(_) => (EdgeChange::Unchanged, RequestOutcome::AlreadyPending),
    })
}

fn decide_accept(
    current: Option<&FriendshipEdge>,
    user: &UserId,
    requester: &UserId,
    now: i64,
) -> Result<(EdgeChange, FriendshipEdge)> {
    match current {
        Some(edge) if edge.is_pending_from(requester) => {
            let accepted = edge.accepted(now);
            Ok((EdgeChange::Write(accepted.clone()), accepted))
        }
        _ => Err(no_pending_request(user, requester)),
    }
}

fn decide_deny(
    current: Option<&FriendshipEdge>,
    user: &UserId,
    requester: &UserId,
) -> Result<(EdgeChange, ())> {
    match current {
        Some(edge) if edge.is_pending_from(requester) => Ok((EdgeChange::Delete, ())),
        _ => Err(no_pending_request(user, requester)),
    }
}

fn decide_remove(current: Option<&FriendshipEdge>) -> (EdgeChange, bool) {
    match current {
        Some(edge) if edge.is_accepted() => (EdgeChange::Delete, true),
        _ => (EdgeChange::Unchanged, false),
    }
}

fn no_pending_request(user: &UserId, requester: &UserId) -> RelationshipError {
    RelationshipError::InvalidTransition(format!(
        "No pending request from {requester} to {user}"
    ))
}
