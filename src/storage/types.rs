use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The feed table is empty, so there is nothing to scrape
    #[error("No feeds registered yet")]
    NoFeeds,

    /// A lookup by key matched no row
    #[error("{0} not found")]
    NotFound(String),

    /// A UNIQUE constraint rejected the insert
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Another process holds a lock on the database file
    #[error("The database is locked by another process. Please try again.")]
    Locked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a sqlx error, detecting lock contention from SQLite's messages.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
        {
            return DatabaseError::Locked;
        }

        DatabaseError::Other(err)
    }

    /// Map a UNIQUE violation to `AlreadyExists(what)`, anything else through `from_sqlx`.
    pub(crate) fn on_conflict(err: sqlx::Error, what: impl FnOnce() -> String) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists(what());
            }
        }
        Self::from_sqlx(err)
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Stored timestamps are Unix epoch milliseconds.
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn created(&self) -> DateTime<Utc> {
        from_millis(self.created_at)
    }

    pub fn updated(&self) -> DateTime<Utc> {
        from_millis(self.updated_at)
    }
}

/// Feed row.
///
/// `last_fetched_at` is `None` until the scrape loop first picks the feed.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_fetched_at: Option<i64>,
}

impl Feed {
    pub fn created(&self) -> DateTime<Utc> {
        from_millis(self.created_at)
    }

    pub fn updated(&self) -> DateTime<Utc> {
        from_millis(self.updated_at)
    }

    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.last_fetched_at.map(from_millis)
    }
}

/// Feed joined with the name of the user who added it (`feeds` listing)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithOwner {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_name: String,
}

/// A user/feed subscription, joined with both display names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub feed_name: String,
    pub user_name: String,
}

impl FeedFollow {
    pub fn created(&self) -> DateTime<Utc> {
        from_millis(self.created_at)
    }
}
