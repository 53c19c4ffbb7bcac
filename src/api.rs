//! Entry point for page handlers.
//!
//! [`PhotoShareCore`] owns the user, friendship and content stores and
//! routes every content read through the access-control gate. Each
//! operation takes the acting [`Identity`] explicitly; the core keeps no
//! session state.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::access::AccessControlService;
use crate::config::CoreConfig;
use crate::content::{
    files, Accessibility, Album, AlbumId, CleanupReport, Comment, ContentError, ContentRepository,
    ContentStore, NewAlbum, NewPicture, Picture, PictureId,
};
use crate::error::{CoreError, Result};
use crate::relationship::{
    FriendshipEdge, FriendshipState, RelationshipService, RelationshipStore, RequestOutcome,
};
use crate::user::{Identity, User, UserDirectory, UserId, UserStorage};

/// A friend as listed on the friends page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendSummary {
    /// The friend's identifier.
    pub id: UserId,
    /// Display name, or the identifier if the user row is gone.
    pub name: String,
    /// Number of albums the friend shares.
    pub shared_albums: usize,
}

/// A friend request waiting for the current user's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRequest {
    /// Who sent the request.
    pub requester: UserId,
    /// The requester's display name.
    pub name: String,
}

/// Core interface for the photo-sharing site.
///
/// # Example
///
/// ```no_run
/// use photoshare_core::config::CoreConfig;
/// use photoshare_core::user::AuthenticatedUser;
/// use photoshare_core::PhotoShareCore;
///
/// let core = PhotoShareCore::open(&CoreConfig::new("/srv/photos"))?;
/// let alice = AuthenticatedUser("alice".into());
/// core.send_friend_request(&alice, "bob")?;
/// # Ok::<(), photoshare_core::CoreError>(())
/// ```
pub struct PhotoShareCore {
    users: Arc<UserStorage>,
    relationships: RelationshipService,
    content: ContentStore,
    uploads_dir: PathBuf,
}

impl PhotoShareCore {
    /// Opens the core described by `config`.
    ///
    /// Creates the data and uploads directories and the database tables if
    /// they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the directories
    /// or database cannot be created.
    pub fn open(config: &CoreConfig) -> Result<Self> {
        config.validate()?;

        let uploads_dir = config.uploads_path();
        for dir in [&config.data_dir, &uploads_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                CoreError::Storage(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
        }

        let db_path = config.database_path();
        let timeout = config.busy_timeout();
        let users = Arc::new(UserStorage::open(&db_path, timeout)?);
        let relationships = RelationshipStore::open(&db_path, timeout)?;
        let content = ContentStore::open(&db_path, timeout)?;

        log::info!("opened photo store at {}", db_path.display());
        Ok(Self::assemble(users, relationships, content, uploads_dir))
    }

    /// Creates a core backed by in-memory databases for testing.
    ///
    /// Picture files still go to `uploads_dir`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the databases cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory(uploads_dir: &Path) -> Result<Self> {
        Ok(Self::assemble(
            Arc::new(UserStorage::in_memory()?),
            RelationshipStore::in_memory()?,
            ContentStore::in_memory()?,
            uploads_dir.to_path_buf(),
        ))
    }

    fn assemble(
        users: Arc<UserStorage>,
        relationships: RelationshipStore,
        content: ContentStore,
        uploads_dir: PathBuf,
    ) -> Self {
        let directory: Arc<dyn UserDirectory> = users.clone();
        Self {
            users,
            relationships: RelationshipService::new(relationships, directory),
            content,
            uploads_dir,
        }
    }

    /// The authorization gate over this core's stores.
    #[must_use]
    pub fn access(&self) -> AccessControlService<'_> {
        AccessControlService::new(&self.relationships, &self.content)
    }

    /// The friendship service.
    #[must_use]
    pub const fn relationships(&self) -> &RelationshipService {
        &self.relationships
    }

    /// The content store.
    #[must_use]
    pub const fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Directory picture files are stored in.
    #[must_use]
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    // ==================== Users ====================

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the id or name is blank or the id is taken.
    pub fn register_user(&self, id: &str, name: &str) -> Result<User> {
        let id = UserId::parse(id)?;
        Ok(self.users.create_user(&id, name)?)
    }

    /// Looks up a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.get_user(id)?)
    }

    // ==================== Friendships ====================

    /// Sends a friend request from the current user to `friend_id`.
    ///
    /// `friend_id` is taken as typed into the form; surrounding whitespace
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `friend_id` is blank, names the current user or
    /// an unknown user, or storage fails.
    pub fn send_friend_request(
        &self,
        who: &impl Identity,
        friend_id: &str,
    ) -> Result<RequestOutcome> {
        let friend = UserId::parse(friend_id)?;
        Ok(self
            .relationships
            .request_friend(&who.current_user(), &friend)?)
    }

    /// Accepts the pending requests from each of `requesters`, in order.
    ///
    /// Stops at the first failure; requests accepted before it stay
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if any requester has no pending request to the
    /// current user.
    pub fn accept_requests(
        &self,
        who: &impl Identity,
        requesters: &[UserId],
    ) -> Result<Vec<FriendshipEdge>> {
        let me = who.current_user();
        let mut accepted = Vec::with_capacity(requesters.len());
        for requester in requesters {
            accepted.push(self.relationships.accept_request(&me, requester)?);
        }
        Ok(accepted)
    }

    /// Denies the pending requests from each of `requesters`, in order.
    ///
    /// Stops at the first failure like [`Self::accept_requests`].
    ///
    /// # Errors
    ///
    /// Returns an error if any requester has no pending request to the
    /// current user.
    pub fn deny_requests(&self, who: &impl Identity, requesters: &[UserId]) -> Result<usize> {
        let me = who.current_user();
        for requester in requesters {
            self.relationships.deny_request(&me, requester)?;
        }
        Ok(requesters.len())
    }

    /// Ends the current user's friendship with `friend`.
    ///
    /// Returns whether a friendship existed.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn defriend(&self, who: &impl Identity, friend: &UserId) -> Result<bool> {
        Ok(self
            .relationships
            .remove_friendship(&who.current_user(), friend)?)
    }

    /// Ends the current user's friendships with each of `friends`.
    ///
    /// Returns how many friendships were actually removed. Ids that are not
    /// friends, including pending requests, are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails. Removals before the failure stay
    /// committed.
    pub fn defriend_many(&self, who: &impl Identity, friends: &[UserId]) -> Result<usize> {
        let me = who.current_user();
        let mut removed = 0;
        for friend in friends {
            if self.relationships.remove_friendship(&me, friend)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// How the current user relates to `other`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn friendship_state(&self, who: &impl Identity, other: &UserId) -> Result<FriendshipState> {
        Ok(self
            .relationships
            .friendship_state(&who.current_user(), other)?)
    }

    /// The current user's friends with their names and shared album counts,
    /// ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn friends_overview(&self, who: &impl Identity) -> Result<Vec<FriendSummary>> {
        let friends = self.relationships.friends_of(&who.current_user())?;
        let mut names = self.display_names(&friends)?;

        let mut overview = Vec::with_capacity(friends.len());
        for id in friends {
            let shared_albums = self.content.count_shared_albums(&id)?;
            let name = names.remove(&id).unwrap_or_else(|| id.to_string());
            overview.push(FriendSummary {
                id,
                name,
                shared_albums,
            });
        }
        Ok(overview)
    }

    /// Friend requests awaiting the current user's answer, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn pending_requests(&self, who: &impl Identity) -> Result<Vec<PendingRequest>> {
        let requesters = self
            .relationships
            .pending_requests_for(&who.current_user())?;
        let mut names = self.display_names(&requesters)?;

        Ok(requesters
            .into_iter()
            .map(|requester| {
                let name = names
                    .remove(&requester)
                    .unwrap_or_else(|| requester.to_string());
                PendingRequest { requester, name }
            })
            .collect())
    }

    /// Requests the current user has sent that are still unanswered.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn outgoing_requests(&self, who: &impl Identity) -> Result<Vec<UserId>> {
        Ok(self
            .relationships
            .outgoing_requests(&who.current_user())?)
    }

    fn display_names(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>> {
        Ok(self
            .users
            .get_users(ids)?
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect())
    }

    // ==================== Viewing Content ====================

    /// The current user's own albums.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn my_albums(&self, who: &impl Identity) -> Result<Vec<Album>> {
        Ok(self.content.list_albums_by_owner(&who.current_user())?)
    }

    /// The shared albums of `friend`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Access`] with `AccessDenied` unless the current
    /// user and `friend` are friends.
    pub fn friend_albums(&self, who: &impl Identity, friend: &UserId) -> Result<Vec<Album>> {
        let me = who.current_user();
        if !self.relationships.are_friends(&me, friend)? {
            log::warn!("denied {me} the album list of {friend}");
            return Err(CoreError::access_denied());
        }
        Ok(self.content.list_shared_albums(friend)?)
    }

    /// The pictures of an album the current user may view.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Access`] with `AccessDenied` if the album is
    /// missing or hidden.
    pub fn album_pictures(&self, who: &impl Identity, album: AlbumId) -> Result<Vec<Picture>> {
        let album = self.access().authorized_album(&who.current_user(), album)?;
        Ok(self.content.list_pictures(album.id)?)
    }

    /// A picture the current user may view, with its comments newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Access`] with `AccessDenied` if the picture is
    /// missing or hidden.
    pub fn picture_comments(
        &self,
        who: &impl Identity,
        picture: PictureId,
    ) -> Result<(Picture, Vec<Comment>)> {
        let (picture, _) = self
            .access()
            .authorized_picture(&who.current_user(), picture)?;
        let comments = self.content.list_comments(picture.id)?;
        Ok((picture, comments))
    }

    /// Adds a comment by the current user to a picture they may view.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Access`] with `AccessDenied` if the picture is
    /// missing or hidden, or [`ContentError::InvalidData`] for blank text.
    pub fn comment_on_picture(
        &self,
        who: &impl Identity,
        picture: PictureId,
        text: &str,
    ) -> Result<Comment> {
        let me = who.current_user();
        let (picture, _) = self.access().authorized_picture(&me, picture)?;

        Ok(self.content.add_comment(picture.id, &me, text)?)
    }

    // ==================== Managing Own Content ====================

    /// Creates an album owned by the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is blank or storage fails.
    pub fn create_album(&self, who: &impl Identity, album: &NewAlbum) -> Result<Album> {
        Ok(self.content.create_album(&who.current_user(), album)?)
    }

    /// Changes the accessibility of one of the current user's albums.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the current user owns no such
    /// album.
    pub fn set_album_accessibility(
        &self,
        who: &impl Identity,
        album: AlbumId,
        accessibility: Accessibility,
    ) -> Result<()> {
        if self
            .content
            .set_accessibility(album, &who.current_user(), accessibility)?
        {
            Ok(())
        } else {
            Err(ContentError::NotFound(format!("album {album}")).into())
        }
    }

    /// Stores a picture file in one of the current user's albums.
    ///
    /// The file is written while the picture row is held uncommitted, so
    /// [`Self::sweep_uploads`] never sees it without its row. Existing files
    /// are never overwritten, and the file is removed again if the row
    /// cannot be committed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Access`] with `AccessDenied` if the album is
    /// missing or owned by someone else, [`ContentError::InvalidData`] for
    /// a bad or taken file name, or an error if writing fails.
    pub fn upload_picture(
        &self,
        who: &impl Identity,
        album: AlbumId,
        picture: &NewPicture,
        bytes: &[u8],
    ) -> Result<Picture> {
        let me = who.current_user();
        let album = self
            .content
            .get_album(album)?
            .filter(|a| a.owner == me)
            .ok_or_else(CoreError::access_denied)?;

        files::validate_file_name(&picture.file_name)?;
        let path = self.uploads_dir.join(&picture.file_name);
        let mut written = false;
        let result = self.content.add_picture_with(album.id, picture, || {
            write_new_file(&path, bytes).map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    ContentError::InvalidData(format!(
                        "Picture file name already in use: {}",
                        picture.file_name
                    ))
                } else {
                    ContentError::Io(e)
                }
            })?;
            written = true;
            Ok(())
        });

        match result {
            Ok(stored) => {
                log::info!("{me} uploaded {} to album {}", stored.file_name, album.id);
                Ok(stored)
            }
            Err(e) => {
                if written {
                    if let Err(cleanup) = std::fs::remove_file(&path) {
                        log::warn!("failed to remove {}: {cleanup}", path.display());
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Deletes one of the current user's albums with its pictures and
    /// comments, then removes the picture files.
    ///
    /// The database rows are gone once this returns `Ok`; files that could
    /// not be removed are listed in the report for a later
    /// [`Self::sweep_uploads`].
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the current user owns no such
    /// album. Nothing is deleted in that case.
    pub fn delete_album(&self, who: &impl Identity, album: AlbumId) -> Result<CleanupReport> {
        let me = who.current_user();
        let names = self.content.delete_album(album, &me)?;
        let report = files::remove_picture_files(&self.uploads_dir, &names);

        log::info!(
            "{me} deleted album {album}: {} files removed, {} failed",
            report.removed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Removes files in the uploads directory that no picture references.
    ///
    /// Uploads wait until the sweep has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn sweep_uploads(&self) -> Result<CleanupReport> {
        let report = self
            .content
            .with_file_names_locked(|known| files::sweep_orphaned_files(&self.uploads_dir, known))??;
        Ok(report)
    }
}

fn write_new_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    if written.is_err() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("failed to remove partial upload {}: {e}", path.display());
        }
    }
    written
}
