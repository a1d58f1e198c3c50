//! Tag repository trait and implementation

use crate::error::Result;
use crate::models::Tag;
use async_trait::async_trait;
use bridge_traits::time::{Clock, SystemClock};
use sqlx::{query, query_as, SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::instrument;

/// Tag repository interface
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Tag names ordered ascending, optionally restricted to names containing
    /// `query` (case-sensitive substring), at most `limit` of them
    async fn search(&self, query: Option<&str>, limit: u32) -> Result<Vec<String>>;

    /// Find a tag by its exact name
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// Return the tag with this name, creating it if missing
    async fn get_or_create(&self, name: &str) -> Result<Tag>;

    /// Count all tags, orphans included
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of TagRepository
pub struct SqliteTagRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteTagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

/// Resolve tag names to rows inside an open transaction, creating the
/// missing ones. Returned tags follow the order of `names`.
pub(crate) async fn ensure_tags(
    conn: &mut SqliteConnection,
    names: &[String],
    now: i64,
) -> Result<Vec<Tag>> {
    let mut tags = Vec::with_capacity(names.len());

    for name in names {
        let candidate = Tag::new(name.clone());

        query(
            "INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(&candidate.id)
        .bind(&candidate.name)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let tag = query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

        tags.push(tag);
    }

    Ok(tags)
}

#[async_trait]
impl TagRepository for SqliteTagRepository {
    #[instrument(skip(self))]
    async fn search(&self, q: Option<&str>, limit: u32) -> Result<Vec<String>> {
        let rows = match q.filter(|q| !q.is_empty()) {
            Some(q) => {
                query_as::<_, (String,)>(
                    "SELECT name FROM tags WHERE instr(name, ?) > 0 ORDER BY name ASC LIMIT ?",
                )
                .bind(q)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                query_as::<_, (String,)>("SELECT name FROM tags ORDER BY name ASC LIMIT ?")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    async fn get_or_create(&self, name: &str) -> Result<Tag> {
        let mut conn = self.pool.acquire().await?;
        let mut tags =
            ensure_tags(&mut conn, &[name.to_string()], self.clock.unix_timestamp_millis()).await?;
        tags.pop()
            .ok_or_else(|| crate::LibraryError::NotFound {
                entity_type: "Tag".to_string(),
                id: name.to_string(),
            })
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }
}
