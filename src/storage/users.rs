use chrono::{DateTime, Utc};

use super::schema::Database;
use super::types::{to_millis, DatabaseError, User};

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Insert a new user. Names are unique.
    pub async fn create_user(&self, name: &str, now: DateTime<Utc>) -> Result<User, DatabaseError> {
        let now = to_millis(now);
        sqlx::query_as::<_, User>(
            "INSERT INTO users (created_at, updated_at, name) VALUES (?, ?, ?)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(now)
        .bind(now)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_conflict(e, || format!("User '{}'", name)))
    }

    pub async fn get_user(&self, name: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .ok_or_else(|| DatabaseError::NotFound(format!("User '{}'", name)))
    }

    /// All users, oldest first
    pub async fn get_users(&self) -> Result<Vec<User>, DatabaseError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Delete every user. Feeds and follows go with them (ON DELETE CASCADE).
    ///
    /// Returns the number of users removed.
    pub async fn delete_users(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected())
    }
}
