//! Integration tests for the friend-request flow.
//!
//! These tests drive the flow through [`PhotoShareCore`] on a file-backed
//! database:
//! - request, accept, deny and remove
//! - counter-requests that accept automatically
//! - persistence across reopening the site

mod helpers;

use helpers::{as_user, id, TestSite};
use photoshare_core::content::Accessibility;
use photoshare_core::relationship::{FriendshipState, FriendshipStatus, RelationshipError, RequestOutcome};
use photoshare_core::CoreError;

#[test]
fn request_then_accept_makes_friends_both_ways() {
    let site = TestSite::with_users(&["alice", "bob"]);

    let outcome = site
        .core
        .send_friend_request(&as_user("alice"), "bob")
        .unwrap();
    assert_eq!(outcome, RequestOutcome::Requested);
    assert_eq!(
        site.core.friendship_state(&as_user("bob"), &id("alice")).unwrap(),
        FriendshipState::RequestReceived
    );

    let edges = site
        .core
        .accept_requests(&as_user("bob"), &[id("alice")])
        .unwrap();

    assert_eq!(edges[0].status, FriendshipStatus::Accepted);
    assert_eq!(edges[0].requester, id("alice"));
    assert!(edges[0].responded_at.is_some());
    for (a, b) in [("alice", "bob"), ("bob", "alice")] {
        assert_eq!(
            site.core.friendship_state(&as_user(a), &id(b)).unwrap(),
            FriendshipState::Friends
        );
    }
}

#[test]
fn requester_cannot_accept_own_request() {
    let site = TestSite::with_users(&["alice", "bob"]);
    site.core
        .send_friend_request(&as_user("alice"), "bob")
        .unwrap();

    let err = site
        .core
        .accept_requests(&as_user("alice"), &[id("bob")])
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Relationship(RelationshipError::InvalidTransition(_))
    ));
    assert_eq!(
        site.core.friendship_state(&as_user("alice"), &id("bob")).unwrap(),
        FriendshipState::RequestSent
    );
}

#[test]
fn counter_request_accepts_automatically() {
    let site = TestSite::with_users(&["alice", "bob"]);
    site.core
        .send_friend_request(&as_user("alice"), "bob")
        .unwrap();

    let outcome = site
        .core
        .send_friend_request(&as_user("bob"), "alice")
        .unwrap();

    assert_eq!(outcome, RequestOutcome::AutoAccepted);
    assert!(site.core.pending_requests(&as_user("alice")).unwrap().is_empty());
    assert!(site.core.pending_requests(&as_user("bob")).unwrap().is_empty());
    assert_eq!(site.core.friends_overview(&as_user("alice")).unwrap().len(), 1);
}

#[test]
fn repeated_requests_are_idempotent() {
    let site = TestSite::with_users(&["alice", "bob"]);
    let alice = as_user("alice");

    assert_eq!(
        site.core.send_friend_request(&alice, "bob").unwrap(),
        RequestOutcome::Requested
    );
    assert_eq!(
        site.core.send_friend_request(&alice, "bob").unwrap(),
        RequestOutcome::AlreadyPending
    );
    assert_eq!(site.core.pending_requests(&as_user("bob")).unwrap().len(), 1);

    site.core.accept_requests(&as_user("bob"), &[id("alice")]).unwrap();
    assert_eq!(
        site.core.send_friend_request(&alice, "bob").unwrap(),
        RequestOutcome::AlreadyFriends
    );
}

#[test]
fn denied_request_can_be_sent_again() {
    let site = TestSite::with_users(&["alice", "bob"]);
    site.core
        .send_friend_request(&as_user("alice"), "bob")
        .unwrap();
    site.core
        .deny_requests(&as_user("bob"), &[id("alice")])
        .unwrap();

    assert_eq!(
        site.core.friendship_state(&as_user("alice"), &id("bob")).unwrap(),
        FriendshipState::None
    );
    assert_eq!(
        site.core
            .send_friend_request(&as_user("alice"), "bob")
            .unwrap(),
        RequestOutcome::Requested
    );
}

#[test]
fn defriend_leaves_pending_request_untouched() {
    let site = TestSite::with_users(&["alice", "bob"]);
    site.core
        .send_friend_request(&as_user("alice"), "bob")
        .unwrap();

    assert!(!site.core.defriend(&as_user("bob"), &id("alice")).unwrap());
    assert_eq!(
        site.core.friendship_state(&as_user("bob"), &id("alice")).unwrap(),
        FriendshipState::RequestReceived
    );
}

#[test]
fn friendships_survive_reopening() {
    let site = TestSite::with_users(&["alice", "bob", "carol"]);
    site.befriend("alice", "bob");
    site.core
        .send_friend_request(&as_user("carol"), "alice")
        .unwrap();

    let reopened = site.reopen();

    assert!(reopened
        .relationships()
        .are_friends(&id("bob"), &id("alice"))
        .unwrap());
    let pending = reopened.pending_requests(&as_user("alice")).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].requester, id("carol"));
    assert_eq!(pending[0].name, "Carol");
}

/// The walkthrough from the site's help page: alice shares a trip album
/// with bob, then unfriends him.
#[test]
fn trip_album_walkthrough() {
    let site = TestSite::with_users(&["alice", "bob"]);
    let trip = site.album("alice", "Trip", Accessibility::Shared);
    let picture = site.picture("alice", &trip, "beach.jpg");

    assert!(site
        .core
        .album_pictures(&as_user("bob"), trip.id)
        .unwrap_err()
        .is_access_denied());

    site.core
        .send_friend_request(&as_user("alice"), "bob")
        .unwrap();
    assert!(site
        .core
        .album_pictures(&as_user("bob"), trip.id)
        .unwrap_err()
        .is_access_denied());

    site.core
        .accept_requests(&as_user("bob"), &[id("alice")])
        .unwrap();
    assert_eq!(
        site.core.album_pictures(&as_user("bob"), trip.id).unwrap(),
        vec![picture.clone()]
    );
    site.core
        .comment_on_picture(&as_user("bob"), picture.id, "Lovely!")
        .unwrap();

    site.core.defriend(&as_user("alice"), &id("bob")).unwrap();
    assert!(site
        .core
        .picture_comments(&as_user("bob"), picture.id)
        .unwrap_err()
        .is_access_denied());
    let (_, comments) = site
        .core
        .picture_comments(&as_user("alice"), picture.id)
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author, id("bob"));
}
