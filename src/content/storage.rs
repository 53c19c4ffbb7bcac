//! `SQLite` storage for albums, pictures and comments.
//!
//! Pictures reference their album and comments reference their picture
//! through enforced foreign keys without `ON DELETE CASCADE`. Removing an
//! album is therefore always the explicit, single-transaction cascade in
//! [`ContentStore::delete_album`].

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::error::{ContentError, Result};
use super::files::validate_file_name;
use super::types::{
    Accessibility, Album, AlbumId, Comment, CommentId, NewAlbum, NewPicture, Picture, PictureId,
};
use super::ContentRepository;
use crate::db;
use crate::user::UserId;

/// `SQLite`-based storage for albums, pictures and comments.
pub struct ContentStore {
    conn: Mutex<Connection>,
}

const ALBUM_COLUMNS: &str =
    "album_id, owner_id, title, description, accessibility, created_at";
const PICTURE_COLUMNS: &str =
    "picture_id, album_id, file_name, title, description, uploaded_at";
const COMMENT_COLUMNS: &str = "comment_id, picture_id, author_id, comment_text, created_at";

/// Album columns as read from a row, before validation.
struct RawAlbum {
    id: i64,
    owner: String,
    title: String,
    description: Option<String>,
    accessibility: String,
    created_at: i64,
}

impl RawAlbum {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            accessibility: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_album(self) -> Result<Album> {
        let accessibility = Accessibility::parse(&self.accessibility).ok_or_else(|| {
            ContentError::InvalidData(format!("Invalid accessibility: {}", self.accessibility))
        })?;
        Ok(Album {
            id: AlbumId(self.id),
            owner: UserId::from(self.owner),
            title: self.title,
            description: self.description,
            accessibility,
            created_at: self.created_at,
        })
    }
}

fn picture_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Picture> {
    Ok(Picture {
        id: PictureId(row.get(0)?),
        album_id: AlbumId(row.get(1)?),
        file_name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        uploaded_at: row.get(5)?,
    })
}

fn comment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: CommentId(row.get(0)?),
        picture_id: PictureId(row.get(1)?),
        author: UserId::from(row.get::<_, String>(2)?),
        text: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ContentStore {
    /// Creates a new storage instance at the given path.
    ///
    /// Creates the database file and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        Self::open(path, db::DEFAULT_BUSY_TIMEOUT)
    }

    /// Creates a storage instance with an explicit write-lock timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(db::open(path, busy_timeout)?),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(db::open_in_memory()?),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ContentError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS albums (
                album_id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                accessibility TEXT NOT NULL DEFAULT 'private'
                    CHECK (accessibility IN ('private', 'shared')),
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_albums_owner ON albums (owner_id);

            CREATE TABLE IF NOT EXISTS pictures (
                picture_id INTEGER PRIMARY KEY AUTOINCREMENT,
                album_id INTEGER NOT NULL REFERENCES albums (album_id),
                file_name TEXT NOT NULL UNIQUE,
                title TEXT,
                description TEXT,
                uploaded_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pictures_album ON pictures (album_id);

            CREATE TABLE IF NOT EXISTS comments (
                comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
                picture_id INTEGER NOT NULL REFERENCES pictures (picture_id),
                author_id TEXT NOT NULL,
                comment_text TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_comments_picture ON comments (picture_id);
            ",
        )?;
        Ok(())
    }

    // ==================== Album Operations ====================

    /// Creates an album owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidData`] if the title is blank, or a
    /// storage error.
    pub fn create_album(&self, owner: &UserId, album: &NewAlbum) -> Result<Album> {
        let title = album.title.trim();
        if title.is_empty() {
            return Err(ContentError::InvalidData("Title is required".to_string()));
        }
        let description = non_blank(album.description.as_deref());
        let now = chrono::Utc::now().timestamp();

        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO albums (owner_id, title, description, accessibility, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                owner.as_str(),
                title,
                &description,
                album.accessibility.as_str(),
                now
            ],
        )?;

        let created = Album {
            id: AlbumId(conn.last_insert_rowid()),
            owner: owner.clone(),
            title: title.to_string(),
            description,
            accessibility: album.accessibility,
            created_at: now,
        };
        log::info!(
            "{owner} created album {} ({})",
            created.id,
            created.accessibility.as_str()
        );
        Ok(created)
    }

    /// Changes an album's accessibility. Only the owner's albums are touched.
    ///
    /// Returns whether a row was updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_accessibility(
        &self,
        album: AlbumId,
        owner: &UserId,
        accessibility: Accessibility,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE albums SET accessibility = ?1 WHERE album_id = ?2 AND owner_id = ?3",
            params![accessibility.as_str(), album.0, owner.as_str()],
        )?;
        if rows > 0 {
            log::info!("album {album} is now {}", accessibility.as_str());
        }
        Ok(rows > 0)
    }

    /// Lists `owner`'s shared albums, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_shared_albums(&self, owner: &UserId) -> Result<Vec<Album>> {
        self.query_albums(
            &format!(
                "SELECT {ALBUM_COLUMNS} FROM albums
                 WHERE owner_id = ?1 AND accessibility = 'shared'
                 ORDER BY album_id"
            ),
            owner,
        )
    }

    /// Counts `owner`'s shared albums.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_shared_albums(&self, owner: &UserId) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM albums WHERE owner_id = ?1 AND accessibility = 'shared'",
            params![owner.as_str()],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|e| ContentError::InvalidData(e.to_string()))
    }

    fn query_albums(&self, sql: &str, owner: &UserId) -> Result<Vec<Album>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![owner.as_str()], RawAlbum::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawAlbum::into_album).collect()
    }

    /// Deletes an album with all of its pictures and their comments.
    ///
    /// Comments, pictures and the album row are removed in one transaction.
    /// Returns the file names of the removed pictures; the caller deletes
    /// those files once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the album does not exist or is
    /// not owned by `owner`, in which case nothing is deleted.
    pub fn delete_album(&self, album: AlbumId, owner: &UserId) -> Result<Vec<String>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored_owner: Option<String> = tx
            .query_row(
                "SELECT owner_id FROM albums WHERE album_id = ?1",
                params![album.0],
                |row| row.get(0),
            )
            .optional()?;
        if stored_owner.as_deref() != Some(owner.as_str()) {
            return Err(ContentError::NotFound(format!("album {album}")));
        }

        let file_names = {
            let mut stmt =
                tx.prepare("SELECT file_name FROM pictures WHERE album_id = ?1 ORDER BY picture_id")?;
            let names = stmt
                .query_map(params![album.0], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            names
        };

        let comments = tx.execute(
            r"
            DELETE FROM comments
            WHERE picture_id IN (SELECT picture_id FROM pictures WHERE album_id = ?1)
            ",
            params![album.0],
        )?;
        let pictures = tx.execute("DELETE FROM pictures WHERE album_id = ?1", params![album.0])?;
        tx.execute("DELETE FROM albums WHERE album_id = ?1", params![album.0])?;
        tx.commit()?;

        log::info!(
            "{owner} deleted album {album} with {pictures} picture(s) and {comments} comment(s)"
        );
        Ok(file_names)
    }

    // ==================== Picture Operations ====================

    /// Records a picture whose file is already in the uploads directory.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the album does not exist,
    /// [`ContentError::InvalidData`] for an unusable or duplicate file name,
    /// or a storage error.
    pub fn add_picture(&self, album: AlbumId, picture: &NewPicture) -> Result<Picture> {
        self.add_picture_with(album, picture, || Ok(()))
    }

    /// Records a picture, calling `store_file` to put its file in place
    /// while the database write lock is held.
    ///
    /// The row becomes visible only after `store_file` succeeds, and
    /// [`Self::with_file_names_locked`] cannot run in between, so a sweep
    /// never sees the new file without its row. If `store_file` fails,
    /// nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::add_picture`], or the error from
    /// `store_file`.
    pub fn add_picture_with<F>(
        &self,
        album: AlbumId,
        picture: &NewPicture,
        store_file: F,
    ) -> Result<Picture>
    where
        F: FnOnce() -> Result<()>,
    {
        validate_file_name(&picture.file_name)?;
        let title = non_blank(picture.title.as_deref());
        let description = non_blank(picture.description.as_deref());
        let now = chrono::Utc::now().timestamp();

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let album_exists = tx
            .query_row(
                "SELECT 1 FROM albums WHERE album_id = ?1",
                params![album.0],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !album_exists {
            return Err(ContentError::NotFound(format!("album {album}")));
        }

        match tx.execute(
            r"
            INSERT INTO pictures (album_id, file_name, title, description, uploaded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![album.0, &picture.file_name, &title, &description, now],
        ) {
            Ok(_) => {}
            Err(e) if db::is_constraint_violation(&e) => {
                return Err(ContentError::InvalidData(format!(
                    "File name already in use: {}",
                    picture.file_name
                )));
            }
            Err(e) => return Err(e.into()),
        }
        let id = PictureId(tx.last_insert_rowid());

        store_file()?;
        tx.commit()?;

        Ok(Picture {
            id,
            album_id: album,
            file_name: picture.file_name.clone(),
            title,
            description,
            uploaded_at: now,
        })
    }

    /// Lists the pictures in an album, in upload order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_pictures(&self, album: AlbumId) -> Result<Vec<Picture>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PICTURE_COLUMNS} FROM pictures WHERE album_id = ?1 ORDER BY picture_id"
        ))?;
        let pictures = stmt
            .query_map(params![album.0], picture_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pictures)
    }

    /// Counts the pictures in an album.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_pictures(&self, album: AlbumId) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pictures WHERE album_id = ?1",
            params![album.0],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|e| ContentError::InvalidData(e.to_string()))
    }

    /// Returns the file names of every stored picture.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn all_file_names(&self) -> Result<HashSet<String>> {
        let conn = self.conn()?;
        Self::select_file_names(&conn)
    }

    /// Runs `f` on the stored file names while holding the database write
    /// lock, so no picture can be recorded until `f` returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn with_file_names_locked<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&HashSet<String>) -> T,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let names = Self::select_file_names(&tx)?;
        let value = f(&names);
        tx.commit()?;
        Ok(value)
    }

    fn select_file_names(conn: &Connection) -> Result<HashSet<String>> {
        let mut stmt = conn.prepare("SELECT file_name FROM pictures")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(names)
    }

    // ==================== Comment Operations ====================

    /// Adds a comment to a picture.
    ///
    /// This does not check whether `author` may see the picture; route
    /// comments through the access-control gate first.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidData`] if the text is blank,
    /// [`ContentError::NotFound`] if the picture does not exist, or a
    /// storage error.
    pub fn add_comment(&self, picture: PictureId, author: &UserId, text: &str) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ContentError::InvalidData(
                "Comment text is required".to_string(),
            ));
        }
        let now = chrono::Utc::now().timestamp();

        let conn = self.conn()?;
        match conn.execute(
            r"
            INSERT INTO comments (picture_id, author_id, comment_text, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![picture.0, author.as_str(), text, now],
        ) {
            Ok(_) => {}
            Err(e) if db::is_constraint_violation(&e) => {
                return Err(ContentError::NotFound(format!("picture {picture}")));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Comment {
            id: CommentId(conn.last_insert_rowid()),
            picture_id: picture,
            author: author.clone(),
            text: text.to_string(),
            created_at: now,
        })
    }

    /// Lists the comments on a picture, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_comments(&self, picture: PictureId) -> Result<Vec<Comment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE picture_id = ?1 ORDER BY comment_id DESC"
        ))?;
        let comments = stmt
            .query_map(params![picture.0], comment_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(comments)
    }
}

impl ContentRepository for ContentStore {
    fn get_album(&self, id: AlbumId) -> Result<Option<Album>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE album_id = ?1"),
            params![id.0],
            RawAlbum::from_row,
        )
        .optional()?
        .map(RawAlbum::into_album)
        .transpose()
    }

    fn get_picture(&self, id: PictureId) -> Result<Option<Picture>> {
        let conn = self.conn()?;
        let picture = conn
            .query_row(
                &format!("SELECT {PICTURE_COLUMNS} FROM pictures WHERE picture_id = ?1"),
                params![id.0],
                picture_from_row,
            )
            .optional()?;
        Ok(picture)
    }

    fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
        let conn = self.conn()?;
        let comment = conn
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
                params![id.0],
                comment_from_row,
            )
            .optional()?;
        Ok(comment)
    }

    fn list_albums_by_owner(&self, owner: &UserId) -> Result<Vec<Album>> {
        self.query_albums(
            &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE owner_id = ?1 ORDER BY album_id"),
            owner,
        )
    }
}
