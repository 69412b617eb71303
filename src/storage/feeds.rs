use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use super::schema::Database;
use super::types::{to_millis, DatabaseError, Feed, FeedWithOwner};

const FEED_COLUMNS: &str = "id, name, url, user_id, created_at, updated_at, last_fetched_at";

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Register a feed owned by `user_id`. URLs are unique across all users.
    pub async fn create_feed(
        &self,
        name: &str,
        url: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Feed, DatabaseError> {
        insert_feed(&self.pool, name, url, user_id, now).await
    }

    /// All feeds with the name of the user that added them
    pub async fn get_feeds(&self) -> Result<Vec<FeedWithOwner>, DatabaseError> {
        sqlx::query_as::<_, FeedWithOwner>(
            r#"
                SELECT f.id, f.name, f.url, u.name AS user_name
                FROM feeds f
                JOIN users u ON u.id = f.user_id
                ORDER BY f.created_at, f.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn get_feed_by_url(&self, url: &str) -> Result<Feed, DatabaseError> {
        sqlx::query_as::<_, Feed>(&format!("SELECT {} FROM feeds WHERE url = ?", FEED_COLUMNS))
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Feed '{}'", url)))
    }

    // ========================================================================
    // Scrape Rotation
    // ========================================================================

    /// The feed that has waited longest since its last fetch.
    ///
    /// Never-fetched feeds (NULL `last_fetched_at`) come first. Ties are broken
    /// by id so the choice is deterministic.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::NoFeeds`] when the feed table is empty.
    pub async fn get_next_feed_to_fetch(&self) -> Result<Feed, DatabaseError> {
        sqlx::query_as::<_, Feed>(&format!(
            "SELECT {} FROM feeds ORDER BY last_fetched_at ASC NULLS FIRST, id ASC LIMIT 1",
            FEED_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .ok_or(DatabaseError::NoFeeds)
    }

    /// Stamp a feed as fetched at `now` and return the updated row.
    ///
    /// Single-statement update. `last_fetched_at` never moves backwards: a `now`
    /// earlier than the stored value leaves the stored value in place.
    pub async fn mark_feed_fetched(
        &self,
        feed_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Feed, DatabaseError> {
        let now = to_millis(now);
        sqlx::query_as::<_, Feed>(&format!(
            "UPDATE feeds
             SET last_fetched_at = MAX(COALESCE(last_fetched_at, ?1), ?1), updated_at = ?1
             WHERE id = ?2
             RETURNING {}",
            FEED_COLUMNS
        ))
        .bind(now)
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .ok_or_else(|| DatabaseError::NotFound(format!("Feed #{}", feed_id)))
    }
}

pub(super) async fn insert_feed<'e, E>(
    executor: E,
    name: &str,
    url: &str,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<Feed, DatabaseError>
where
    E: SqliteExecutor<'e>,
{
    let now = to_millis(now);
    sqlx::query_as::<_, Feed>(&format!(
        "INSERT INTO feeds (created_at, updated_at, name, url, user_id)
         VALUES (?, ?, ?, ?, ?) RETURNING {}",
        FEED_COLUMNS
    ))
    .bind(now)
    .bind(now)
    .bind(name)
    .bind(url)
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(|e| DatabaseError::on_conflict(e, || format!("Feed '{}'", url)))
}
