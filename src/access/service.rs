//! Viewer visibility for albums, pictures and comments.
//!
//! The rule is total over every (viewer, album) pair:
//!
//! | viewer                  | private | shared |
//! |-------------------------|---------|--------|
//! | owner                   | yes     | yes    |
//! | friend of the owner     | no      | yes    |
//! | anyone else             | no      | no     |
//!
//! Pictures and comments have no flag of their own; they are visible
//! exactly when their album is.

use super::error::{AccessError, Result};
use crate::content::{
    Accessibility, Album, AlbumId, Comment, CommentId, ContentRepository, Picture, PictureId,
};
use crate::relationship::RelationshipService;
use crate::user::UserId;

/// A piece of content together with the parents its visibility derives
/// from.
#[derive(Debug, Clone, Copy)]
pub enum ViewTarget<'a> {
    /// An album.
    Album(&'a Album),
    /// A picture and the album it belongs to.
    Picture(&'a Picture, &'a Album),
    /// A comment, its picture, and that picture's album.
    Comment(&'a Comment, &'a Picture, &'a Album),
}

impl<'a> ViewTarget<'a> {
    /// The album whose accessibility governs this target.
    #[must_use]
    pub const fn album(&self) -> &'a Album {
        match *self {
            Self::Album(album) | Self::Picture(_, album) | Self::Comment(_, _, album) => album,
        }
    }

    /// Returns whether the parent links actually match.
    fn is_consistent(&self) -> bool {
        match *self {
            Self::Album(_) => true,
            Self::Picture(picture, album) => picture.album_id == album.id,
            Self::Comment(comment, picture, album) => {
                comment.picture_id == picture.id && picture.album_id == album.id
            }
        }
    }
}

/// The authorization gate every content read goes through.
///
/// Holds no state of its own: each check re-reads the friendship from the
/// relationship store.
#[derive(Clone, Copy)]
pub struct AccessControlService<'a> {
    relationships: &'a RelationshipService,
    content: &'a dyn ContentRepository,
}

impl<'a> AccessControlService<'a> {
    /// Creates a gate over the given friendship graph and content source.
    #[must_use]
    pub fn new(relationships: &'a RelationshipService, content: &'a dyn ContentRepository) -> Self {
        Self {
            relationships,
            content,
        }
    }

    // ==================== Checks on Loaded Rows ====================

    /// Returns whether `viewer` may see `album`.
    ///
    /// # Errors
    ///
    /// Returns an error if the friendship lookup fails.
    pub fn can_view_album(&self, viewer: &UserId, album: &Album) -> Result<bool> {
        if viewer == &album.owner {
            return Ok(true);
        }
        let visible = match album.accessibility {
            Accessibility::Private => false,
            Accessibility::Shared => self.relationships.are_friends(viewer, &album.owner)?,
        };
        log::debug!(
            "{viewer} {} album {}",
            if visible { "may view" } else { "may not view" },
            album.id
        );
        Ok(visible)
    }

    /// Returns whether `viewer` may see `picture`, which must belong to
    /// `album`. A mismatched album denies access.
    ///
    /// # Errors
    ///
    /// Returns an error if the friendship lookup fails.
    pub fn can_view_picture(&self, viewer: &UserId, picture: &Picture, album: &Album) -> Result<bool> {
        self.can_view(viewer, ViewTarget::Picture(picture, album))
    }

    /// Returns whether `viewer` may see `comment`, which must belong to
    /// `picture` in `album`. Mismatched parents deny access.
    ///
    /// # Errors
    ///
    /// Returns an error if the friendship lookup fails.
    pub fn can_view_comment(
        &self,
        viewer: &UserId,
        comment: &Comment,
        picture: &Picture,
        album: &Album,
    ) -> Result<bool> {
        self.can_view(viewer, ViewTarget::Comment(comment, picture, album))
    }

    /// Returns whether `viewer` may see `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the friendship lookup fails.
    pub fn can_view(&self, viewer: &UserId, target: ViewTarget<'_>) -> Result<bool> {
        if !target.is_consistent() {
            log::debug!("{viewer} asked for content with mismatched parents");
            return Ok(false);
        }
        self.can_view_album(viewer, target.album())
    }

    /// Like [`Self::can_view`], but fails instead of returning `false`.
    ///
    /// For write paths such as commenting, which must refuse targets the
    /// viewer cannot see without revealing whether they exist.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AccessDenied`] if `viewer` may not see
    /// `target`, or an error if the friendship lookup fails.
    pub fn assert_can_view(&self, viewer: &UserId, target: ViewTarget<'_>) -> Result<()> {
        if self.can_view(viewer, target)? {
            Ok(())
        } else {
            log::warn!("denied {viewer} access to album {}", target.album().id);
            Err(AccessError::AccessDenied)
        }
    }

    // ==================== Checks by Id ====================

    /// Loads an album `viewer` may see.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AccessDenied`] if the album is missing or
    /// hidden from `viewer`, or an error if a lookup fails.
    pub fn authorized_album(&self, viewer: &UserId, id: AlbumId) -> Result<Album> {
        let album = self.content.get_album(id)?.ok_or(AccessError::AccessDenied)?;
        self.assert_can_view(viewer, ViewTarget::Album(&album))?;
        Ok(album)
    }

    /// Loads a picture `viewer` may see, with its album.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AccessDenied`] if the picture or its album is
    /// missing or hidden from `viewer`, or an error if a lookup fails.
    pub fn authorized_picture(&self, viewer: &UserId, id: PictureId) -> Result<(Picture, Album)> {
        let picture = self
            .content
            .get_picture(id)?
            .ok_or(AccessError::AccessDenied)?;
        let album = self
            .content
            .get_album(picture.album_id)?
            .ok_or(AccessError::AccessDenied)?;
        self.assert_can_view(viewer, ViewTarget::Picture(&picture, &album))?;
        Ok((picture, album))
    }

    /// Loads a comment `viewer` may see, with its picture and album.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AccessDenied`] if any link of the chain is
    /// missing or hidden from `viewer`, or an error if a lookup fails.
    pub fn authorized_comment(
        &self,
        viewer: &UserId,
        id: CommentId,
    ) -> Result<(Comment, Picture, Album)> {
        let comment = self
            .content
            .get_comment(id)?
            .ok_or(AccessError::AccessDenied)?;
        let (picture, album) = self.authorized_picture(viewer, comment.picture_id)?;
        Ok((comment, picture, album))
    }

    /// Returns whether `viewer` may see the album with this id. Missing
    /// albums are reported as not visible.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn can_view_album_id(&self, viewer: &UserId, id: AlbumId) -> Result<bool> {
        denied_as_false(self.authorized_album(viewer, id))
    }

    /// Returns whether `viewer` may see the picture with this id.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn can_view_picture_id(&self, viewer: &UserId, id: PictureId) -> Result<bool> {
        denied_as_false(self.authorized_picture(viewer, id))
    }

    /// Returns whether `viewer` may see the comment with this id.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn can_view_comment_id(&self, viewer: &UserId, id: CommentId) -> Result<bool> {
        denied_as_false(self.authorized_comment(viewer, id))
    }

    /// Lists the albums of `owner` that `viewer` may see.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn visible_albums_of(&self, viewer: &UserId, owner: &UserId) -> Result<Vec<Album>> {
        let albums = self.content.list_albums_by_owner(owner)?;
        if viewer == owner {
            return Ok(albums);
        }
        if !self.relationships.are_friends(viewer, owner)? {
            return Ok(Vec::new());
        }
        Ok(albums
            .into_iter()
            .filter(|album| album.accessibility == Accessibility::Shared)
            .collect())
    }
}

fn denied_as_false<T>(result: Result<T>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(AccessError::AccessDenied) => Ok(false),
        Err(e) => Err(e),
    }
}
