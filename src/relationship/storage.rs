//! `SQLite` storage for friendship edges.
//!
//! Edges are keyed by the normalized pair `(user_low, user_high)`. The
//! primary key makes a second edge for the same pair impossible, and
//! [`RelationshipStore::apply`] runs each read-decide-write cycle inside an
//! `IMMEDIATE` transaction so concurrent writers on a pair are serialized.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::error::{RelationshipError, Result};
use super::types::{EdgeChange, FriendshipEdge, FriendshipStatus, PairKey};
use crate::db;
use crate::user::UserId;

/// `SQLite`-based storage for friendship edges.
pub struct RelationshipStore {
    conn: Mutex<Connection>,
}

/// Edge columns as read from a row, before validation.
struct RawEdge {
    user_low: String,
    user_high: String,
    status: String,
    requester: String,
    requested_at: i64,
    responded_at: Option<i64>,
}

impl RawEdge {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_low: row.get(0)?,
            user_high: row.get(1)?,
            status: row.get(2)?,
            requester: row.get(3)?,
            requested_at: row.get(4)?,
            responded_at: row.get(5)?,
        })
    }

    fn into_edge(self) -> Result<FriendshipEdge> {
        let status = FriendshipStatus::parse(&self.status).ok_or_else(|| {
            RelationshipError::InvalidData(format!("Invalid status: {}", self.status))
        })?;
        let pair = PairKey::new(&UserId::from(self.user_low), &UserId::from(self.user_high))
            .map_err(|_| RelationshipError::InvalidData("Stored edge links a user to itself".into()))?;
        let requester = UserId::from(self.requester);
        if !pair.contains(&requester) {
            return Err(RelationshipError::InvalidData(format!(
                "Requester {requester} is not part of the pair"
            )));
        }

        Ok(FriendshipEdge {
            pair,
            status,
            requester,
            requested_at: self.requested_at,
            responded_at: self.responded_at,
        })
    }
}

const SELECT_EDGE: &str = r"
    SELECT user_low, user_high, status, requester, requested_at, responded_at
    FROM friendships
    WHERE user_low = ?1 AND user_high = ?2
";

impl RelationshipStore {
    /// Creates a new store at the given path.
    ///
    /// Creates the database file and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        Self::open(path, db::DEFAULT_BUSY_TIMEOUT)
    }

    /// Creates a store with an explicit write-lock timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(db::open(path, busy_timeout)?),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Creates an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(db::open_in_memory()?),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            RelationshipError::Storage(format!("Failed to acquire database lock: {e}"))
        })
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r"
            -- One row per unordered pair; user_low < user_high always
            CREATE TABLE IF NOT EXISTS friendships (
                user_low TEXT NOT NULL,
                user_high TEXT NOT NULL,
                status TEXT NOT NULL,
                requester TEXT NOT NULL,
                requested_at INTEGER NOT NULL,
                responded_at INTEGER,
                PRIMARY KEY (user_low, user_high),
                CHECK (user_low < user_high),
                CHECK (requester = user_low OR requester = user_high)
            );

            CREATE INDEX IF NOT EXISTS idx_friendships_high ON friendships (user_high);
            ",
        )?;
        Ok(())
    }

    fn select_edge(conn: &Connection, pair: &PairKey) -> Result<Option<FriendshipEdge>> {
        conn.query_row(
            SELECT_EDGE,
            params![pair.low().as_str(), pair.high().as_str()],
            RawEdge::from_row,
        )
        .optional()?
        .map(RawEdge::into_edge)
        .transpose()
    }

    fn write_edge(conn: &Connection, edge: &FriendshipEdge) -> Result<()> {
        conn.execute(
            r"
            INSERT INTO friendships (user_low, user_high, status, requester, requested_at, responded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_low, user_high) DO UPDATE SET
                status = excluded.status,
                requester = excluded.requester,
                requested_at = excluded.requested_at,
                responded_at = excluded.responded_at
            ",
            params![
                edge.pair.low().as_str(),
                edge.pair.high().as_str(),
                edge.status.as_str(),
                edge.requester.as_str(),
                edge.requested_at,
                edge.responded_at,
            ],
        )?;
        Ok(())
    }

    fn remove_edge(conn: &Connection, pair: &PairKey) -> Result<bool> {
        let rows = conn.execute(
            "DELETE FROM friendships WHERE user_low = ?1 AND user_high = ?2",
            params![pair.low().as_str(), pair.high().as_str()],
        )?;
        Ok(rows > 0)
    }

    fn list_ids(&self, sql: &str, user: &UserId) -> Result<Vec<UserId>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![user.as_str()], |row| row.get::<_, String>(0))?
            .map(|id| id.map(UserId::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Inserts or replaces the edge for its pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_edge(&self, edge: &FriendshipEdge) -> Result<()> {
        let conn = self.conn()?;
        Self::write_edge(&conn, edge)
    }

    /// Looks up the edge for a pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored row
    /// is malformed.
    pub fn find_edge(&self, pair: &PairKey) -> Result<Option<FriendshipEdge>> {
        let conn = self.conn()?;
        Self::select_edge(&conn, pair)
    }

    /// Deletes the edge for a pair.
    ///
    /// Returns whether an edge was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_edge(&self, pair: &PairKey) -> Result<bool> {
        let conn = self.conn()?;
        Self::remove_edge(&conn, pair)
    }

    /// Runs a read-decide-write cycle on one pair atomically.
    ///
    /// `decide` receives the current edge (if any) and returns the change to
    /// apply along with a value for the caller. The write lock is taken before
    /// the read, so a concurrent writer on the same database always observes
    /// the committed result of this cycle. If `decide` fails, nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns the error from `decide`, or a storage error. A
    /// [`EdgeChange::Write`] for a different pair is rejected as invalid data.
    pub fn apply<T, F>(&self, pair: &PairKey, decide: F) -> Result<T>
    where
        F: FnOnce(Option<&FriendshipEdge>) -> Result<(EdgeChange, T)>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = Self::select_edge(&tx, pair)?;
        let (change, value) = decide(current.as_ref())?;

        match change {
            EdgeChange::Unchanged => {}
            EdgeChange::Write(edge) => {
                if &edge.pair != pair {
                    return Err(RelationshipError::InvalidData(
                        "Edge does not belong to the locked pair".to_string(),
                    ));
                }
                Self::write_edge(&tx, &edge)?;
            }
            EdgeChange::Delete => {
                Self::remove_edge(&tx, pair)?;
            }
        }

        tx.commit()?;
        Ok(value)
    }

    /// Lists the friends of `user`, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_accepted(&self, user: &UserId) -> Result<Vec<UserId>> {
        self.list_ids(
            r"
            SELECT CASE WHEN user_low = ?1 THEN user_high ELSE user_low END AS peer
            FROM friendships
            WHERE (user_low = ?1 OR user_high = ?1) AND status = 'accepted'
            ORDER BY peer
            ",
            user,
        )
    }

    /// Lists users with a pending request addressed to `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_pending_incoming(&self, user: &UserId) -> Result<Vec<UserId>> {
        self.list_ids(
            r"
            SELECT requester
            FROM friendships
            WHERE (user_low = ?1 OR user_high = ?1)
              AND status = 'requested'
              AND requester <> ?1
            ORDER BY requested_at, requester
            ",
            user,
        )
    }

    /// Lists users `user` has sent a still-pending request to, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_pending_outgoing(&self, user: &UserId) -> Result<Vec<UserId>> {
        self.list_ids(
            r"
            SELECT CASE WHEN user_low = ?1 THEN user_high ELSE user_low END AS peer
            FROM friendships
            WHERE status = 'requested' AND requester = ?1
            ORDER BY requested_at, peer
            ",
            user,
        )
    }

    /// Counts all stored edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn count_edges(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM friendships", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|e| RelationshipError::InvalidData(e.to_string()))
    }
}
