//! Album, picture and comment records.
//!
//! Only an album's owner and accessibility matter for access control.
//! Titles, descriptions and comment text are carried along for the page
//! handlers but never interpreted here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::user::UserId;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Album row identifier.
    AlbumId
);
row_id!(
    /// Picture row identifier.
    PictureId
);
row_id!(
    /// Comment row identifier.
    CommentId
);

/// Who besides the owner may see an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    /// Only the owner.
    #[default]
    Private,
    /// The owner and the owner's friends.
    Shared,
}

impl Accessibility {
    /// All tiers, in the order they are offered to users.
    pub const ALL: [Self; 2] = [Self::Private, Self::Shared];

    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Shared => "shared",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "private" => Some(Self::Private),
            "shared" => Some(Self::Shared),
            _ => None,
        }
    }
}

/// An album of pictures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Row identifier.
    pub id: AlbumId,
    /// Owning user.
    pub owner: UserId,
    /// Album title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Visibility tier.
    pub accessibility: Accessibility,
    /// When the album was created (Unix timestamp).
    pub created_at: i64,
}

/// Parameters for a new album.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewAlbum {
    /// Album title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Visibility tier.
    pub accessibility: Accessibility,
}

impl NewAlbum {
    /// Creates a private album definition with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            accessibility: Accessibility::Private,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the visibility tier.
    #[must_use]
    pub const fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }
}

/// A picture stored in an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    /// Row identifier.
    pub id: PictureId,
    /// Album this picture belongs to.
    pub album_id: AlbumId,
    /// Name of the uploaded file inside the uploads directory.
    pub file_name: String,
    /// Optional title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// When the picture was uploaded (Unix timestamp).
    pub uploaded_at: i64,
}

/// Parameters for a picture whose file has already been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPicture {
    /// Name of the stored file inside the uploads directory.
    pub file_name: String,
    /// Optional title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
}

impl NewPicture {
    /// Creates a picture definition for a stored file.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            title: None,
            description: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A comment on a picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Row identifier.
    pub id: CommentId,
    /// Picture the comment belongs to.
    pub picture_id: PictureId,
    /// User who wrote the comment.
    pub author: UserId,
    /// Comment text.
    pub text: String,
    /// When the comment was written (Unix timestamp).
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessibility_defaults_to_private() {
        assert_eq!(Accessibility::default(), Accessibility::Private);
        assert_eq!(NewAlbum::new("Trip").accessibility, Accessibility::Private);
    }

    #[test]
    fn accessibility_round_trips_through_storage_string() {
        for tier in Accessibility::ALL {
            assert_eq!(Accessibility::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(Accessibility::parse("friends_of_friends"), None);
        assert_eq!(Accessibility::parse("Shared"), None);
    }

    #[test]
    fn new_album_builder() {
        let album = NewAlbum::new("Trip")
            .with_description("Summer")
            .with_accessibility(Accessibility::Shared);

        assert_eq!(album.title, "Trip");
        assert_eq!(album.description.as_deref(), Some("Summer"));
        assert_eq!(album.accessibility, Accessibility::Shared);
    }

    #[test]
    fn new_picture_builder() {
        let picture = NewPicture::new("beach.jpg")
            .with_title("Beach")
            .with_description("Sunset");

        assert_eq!(picture.file_name, "beach.jpg");
        assert_eq!(picture.title.as_deref(), Some("Beach"));
        assert_eq!(picture.description.as_deref(), Some("Sunset"));
    }

    #[test]
    fn ids_display_as_numbers() {
        assert_eq!(AlbumId(7).to_string(), "7");
        assert_eq!(serde_json::to_string(&PictureId(3)).unwrap(), "3");
    }
}
