// Repository pattern - the follow edge table behind a trait
use async_trait::async_trait;
use rusqlite::params;
use thiserror::Error;

use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("A user cannot follow themself")]
    SelfFollow,

    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Directed edge set over (follower, author) user ids.
#[async_trait]
pub trait FollowGraph: Send + Sync {
    /// Insert the edge if absent. Returns `true` when this call created it.
    async fn follow(&self, follower: &str, author: &str) -> Result<bool, FollowError>;

    /// Remove the edge if present. Returns `true` when an edge was removed.
    async fn unfollow(&self, follower: &str, author: &str) -> Result<bool, FollowError>;

    async fn is_following(&self, follower: &str, author: &str) -> Result<bool, FollowError>;

    /// Ids of every author `user` follows.
    async fn followees_of(&self, user: &str) -> Result<Vec<String>, FollowError>;

    async fn follower_count(&self, user: &str) -> Result<i64, FollowError>;

    async fn followee_count(&self, user: &str) -> Result<i64, FollowError>;
}

/// SQLite implementation
pub struct SqliteFollowGraph {
    pool: DbPool,
}

impl SqliteFollowGraph {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowGraph for SqliteFollowGraph {
    async fn follow(&self, follower: &str, author: &str) -> Result<bool, FollowError> {
        if follower == author {
            return Err(FollowError::SelfFollow);
        }
        let conn = self.pool.get()?;

        // The unique (user_id, author_id) constraint decides; no read first
        let inserted = conn.execute(
            "INSERT INTO follows (id, user_id, author_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, author_id) DO NOTHING",
            params![uuid::Uuid::now_v7().to_string(), follower, author],
        )?;

        Ok(inserted > 0)
    }

    async fn unfollow(&self, follower: &str, author: &str) -> Result<bool, FollowError> {
        let conn = self.pool.get()?;

        let removed = conn.execute(
            "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
            params![follower, author],
        )?;

        Ok(removed > 0)
    }

    async fn is_following(&self, follower: &str, author: &str) -> Result<bool, FollowError> {
        let conn = self.pool.get()?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ?1 AND author_id = ?2)",
            params![follower, author],
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    async fn followees_of(&self, user: &str) -> Result<Vec<String>, FollowError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT author_id FROM follows WHERE user_id = ?1")?;
        let authors = stmt
            .query_map(params![user], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(authors)
    }

    async fn follower_count(&self, user: &str) -> Result<i64, FollowError> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE author_id = ?1",
            params![user],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn followee_count(&self, user: &str) -> Result<i64, FollowError> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE user_id = ?1",
            params![user],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
