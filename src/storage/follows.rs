use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::feeds::insert_feed;
use super::schema::Database;
use super::types::{to_millis, DatabaseError, Feed, FeedFollow};

impl Database {
    // ========================================================================
    // Feed Follow Operations
    // ========================================================================

    /// Subscribe `user_id` to `feed_id`, returning the follow with both names.
    pub async fn create_feed_follow(
        &self,
        user_id: i64,
        feed_id: i64,
        now: DateTime<Utc>,
    ) -> Result<FeedFollow, DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_sqlx)?;
        let follow = insert_follow(&mut *tx, user_id, feed_id, now).await?;
        tx.commit().await.map_err(DatabaseError::from_sqlx)?;
        Ok(follow)
    }

    /// Register a feed and subscribe its owner to it in one transaction.
    ///
    /// Either both rows are written or neither is, so a failed follow never
    /// leaves an orphan feed blocking a retry with the same URL.
    pub async fn create_feed_with_follow(
        &self,
        name: &str,
        url: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(Feed, FeedFollow), DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_sqlx)?;
        let feed = insert_feed(&mut *tx, name, url, user_id, now).await?;
        let follow = insert_follow(&mut *tx, user_id, feed.id, now).await?;
        tx.commit().await.map_err(DatabaseError::from_sqlx)?;
        Ok((feed, follow))
    }

    /// Every follow for a user, in the order they were created
    pub async fn get_feed_follows_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<FeedFollow>, DatabaseError> {
        sqlx::query_as::<_, FeedFollow>(
            r#"
                SELECT ff.id, ff.user_id, ff.feed_id, ff.created_at, ff.updated_at,
                       f.name AS feed_name, u.name AS user_name
                FROM feed_follows ff
                JOIN feeds f ON f.id = ff.feed_id
                JOIN users u ON u.id = ff.user_id
                WHERE ff.user_id = ?
                ORDER BY ff.created_at, ff.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Remove a follow.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::NotFound`] if the user was not following the feed.
    pub async fn delete_feed_follow(&self, user_id: i64, feed_id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Follow of feed #{}", feed_id)));
        }
        Ok(())
    }
}

async fn insert_follow(
    conn: &mut SqliteConnection,
    user_id: i64,
    feed_id: i64,
    now: DateTime<Utc>,
) -> Result<FeedFollow, DatabaseError> {
    let now = to_millis(now);
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO feed_follows (created_at, updated_at, user_id, feed_id)
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(now)
    .bind(now)
    .bind(user_id)
    .bind(feed_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| DatabaseError::on_conflict(e, || format!("Follow of feed #{}", feed_id)))?;

    sqlx::query_as::<_, FeedFollow>(
        r#"
            SELECT ff.id, ff.user_id, ff.feed_id, ff.created_at, ff.updated_at,
                   f.name AS feed_name, u.name AS user_name
            FROM feed_follows ff
            JOIN feeds f ON f.id = ff.feed_id
            JOIN users u ON u.id = ff.user_id
            WHERE ff.id = ?
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await
    .map_err(DatabaseError::from_sqlx)
}
