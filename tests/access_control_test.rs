//! Integration tests for content visibility.
//!
//! Covers the owner/friend/stranger matrix over both accessibility tiers
//! and the id-based lookups that must not reveal whether content exists.

mod helpers;

use helpers::{as_user, id, TestSite};
use photoshare_core::access::{AccessError, ViewTarget};
use photoshare_core::content::{Accessibility, AlbumId, CommentId, PictureId};

#[test]
fn visibility_matrix() {
    let site = TestSite::with_users(&["owner", "friend", "stranger", "requester"]);
    site.befriend("owner", "friend");
    site.core
        .send_friend_request(&as_user("requester"), "owner")
        .unwrap();

    // (viewer, private visible, shared visible)
    let expected = [
        ("owner", true, true),
        ("friend", false, true),
        ("stranger", false, false),
        ("requester", false, false),
    ];

    let private = site.album("owner", "Private", Accessibility::Private);
    let shared = site.album("owner", "Shared", Accessibility::Shared);
    let gate = site.core.access();

    for (viewer, sees_private, sees_shared) in expected {
        assert_eq!(
            gate.can_view_album(&id(viewer), &private).unwrap(),
            sees_private,
            "{viewer} on private album"
        );
        assert_eq!(
            gate.can_view_album(&id(viewer), &shared).unwrap(),
            sees_shared,
            "{viewer} on shared album"
        );
    }
}

#[test]
fn pictures_and_comments_inherit_album_visibility() {
    let site = TestSite::with_users(&["alice", "bob", "carol"]);
    site.befriend("alice", "bob");
    let album = site.album("alice", "Trip", Accessibility::Shared);
    let picture = site.picture("alice", &album, "one.jpg");
    let comment = site
        .core
        .comment_on_picture(&as_user("alice"), picture.id, "first")
        .unwrap();
    let gate = site.core.access();

    for target in [
        ViewTarget::Album(&album),
        ViewTarget::Picture(&picture, &album),
        ViewTarget::Comment(&comment, &picture, &album),
    ] {
        assert!(gate.can_view(&id("bob"), target).unwrap());
        assert!(!gate.can_view(&id("carol"), target).unwrap());
    }

    site.core
        .set_album_accessibility(&as_user("alice"), album.id, Accessibility::Private)
        .unwrap();
    let album = site.core.my_albums(&as_user("alice")).unwrap().remove(0);

    assert!(!gate
        .can_view(&id("bob"), ViewTarget::Comment(&comment, &picture, &album))
        .unwrap());
    assert!(gate
        .can_view(&id("alice"), ViewTarget::Comment(&comment, &picture, &album))
        .unwrap());
}

#[test]
fn missing_content_is_indistinguishable_from_hidden() {
    let site = TestSite::with_users(&["alice", "bob"]);
    let hidden = site.album("alice", "Hidden", Accessibility::Private);
    let picture = site.picture("alice", &hidden, "secret.jpg");
    let gate = site.core.access();
    let bob = id("bob");

    assert!(!gate.can_view_album_id(&bob, hidden.id).unwrap());
    assert!(!gate.can_view_album_id(&bob, AlbumId(424_242)).unwrap());
    assert!(!gate.can_view_picture_id(&bob, picture.id).unwrap());
    assert!(!gate.can_view_picture_id(&bob, PictureId(424_242)).unwrap());
    assert!(!gate.can_view_comment_id(&bob, CommentId(424_242)).unwrap());

    let hidden_err = site
        .core
        .album_pictures(&as_user("bob"), hidden.id)
        .unwrap_err();
    let missing_err = site
        .core
        .album_pictures(&as_user("bob"), AlbumId(424_242))
        .unwrap_err();
    assert_eq!(hidden_err.to_string(), missing_err.to_string());
}

#[test]
fn comment_lookup_by_id_checks_the_whole_chain() {
    let site = TestSite::with_users(&["alice", "bob"]);
    site.befriend("alice", "bob");
    let album = site.album("alice", "Trip", Accessibility::Shared);
    let picture = site.picture("alice", &album, "one.jpg");
    let comment = site
        .core
        .comment_on_picture(&as_user("bob"), picture.id, "nice")
        .unwrap();
    let gate = site.core.access();

    let (loaded, on_picture, in_album) = gate.authorized_comment(&id("bob"), comment.id).unwrap();
    assert_eq!(loaded, comment);
    assert_eq!(on_picture.id, picture.id);
    assert_eq!(in_album.id, album.id);

    site.core.defriend(&as_user("bob"), &id("alice")).unwrap();
    assert!(matches!(
        gate.authorized_comment(&id("bob"), comment.id),
        Err(AccessError::AccessDenied)
    ));
}

#[test]
fn friend_sees_only_shared_albums_in_listing() {
    let site = TestSite::with_users(&["alice", "bob", "carol"]);
    site.befriend("alice", "bob");
    let shared = site.album("alice", "Shared", Accessibility::Shared);
    site.album("alice", "Private", Accessibility::Private);

    assert_eq!(
        site.core.friend_albums(&as_user("bob"), &id("alice")).unwrap(),
        vec![shared.clone()]
    );
    assert_eq!(
        site.core
            .access()
            .visible_albums_of(&id("bob"), &id("alice"))
            .unwrap(),
        vec![shared]
    );
    assert!(site
        .core
        .friend_albums(&as_user("carol"), &id("alice"))
        .unwrap_err()
        .is_access_denied());
    assert_eq!(site.core.my_albums(&as_user("alice")).unwrap().len(), 2);
}
