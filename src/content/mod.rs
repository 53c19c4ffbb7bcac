//! Albums, pictures and comments.
//!
//! Content rows are plain data to the access-control core. The core reads
//! them through [`ContentRepository`]; page handlers use the mutation
//! methods on [`ContentStore`] directly.

pub mod files;

mod error;
mod storage;
pub mod types;

pub use error::{ContentError, Result};
pub use files::CleanupReport;
pub use storage::ContentStore;
pub use types::{
    Accessibility, Album, AlbumId, Comment, CommentId, NewAlbum, NewPicture, Picture, PictureId,
};

use crate::user::UserId;

/// Read access to content rows, as needed by access control.
pub trait ContentRepository: Send + Sync {
    /// Looks up an album.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn get_album(&self, id: AlbumId) -> Result<Option<Album>>;

    /// Looks up a picture.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn get_picture(&self, id: PictureId) -> Result<Option<Picture>>;

    /// Looks up a comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn get_comment(&self, id: CommentId) -> Result<Option<Comment>>;

    /// Lists all albums owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn list_albums_by_owner(&self, owner: &UserId) -> Result<Vec<Album>>;
}
