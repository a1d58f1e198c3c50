//! Playlist repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{PlaylistFilter, PlaylistRecord, SubmitOutcome, TagSet, TaggedPlaylist};
use crate::repositories::tag::ensure_tags;
use crate::repositories::CursorPage;
use async_trait::async_trait;
use bridge_traits::time::{Clock, SystemClock};
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

const RECORD_COLUMNS: &str = "p.id, p.user_id, p.deleted_at, p.created_at, p.updated_at";

/// Playlist repository interface for data access operations
///
/// "Active" means not soft-deleted. Every listing is ordered by
/// (`updated_at` desc, `id` asc).
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Find a record by id regardless of its deletion state
    async fn find_by_id(&self, id: &str) -> Result<Option<PlaylistRecord>>;

    /// Find an active record with its tags
    async fn find_active_by_id(&self, id: &str) -> Result<Option<TaggedPlaylist>>;

    /// Page through active records matching `filter`, strictly after the
    /// record with id `after`.
    ///
    /// An `after` id that does not exist yields an empty, exhausted page.
    async fn find_active_by_filter(
        &self,
        filter: &PlaylistFilter,
        after: Option<&str>,
        limit: u32,
    ) -> Result<CursorPage<TaggedPlaylist, String>>;

    /// Ids of every active record submitted by `user_id`
    async fn active_ids_for_owner(&self, user_id: &str) -> Result<HashSet<String>>;

    /// Insert the record, or reactivate an existing one, and make its tag
    /// set exactly `tags`. An existing record keeps its original owner.
    async fn create_or_restore(
        &self,
        id: &str,
        user_id: &str,
        tags: &TagSet,
    ) -> Result<SubmitOutcome>;

    /// Atomically replace the tag set of an active record
    ///
    /// # Errors
    /// `LibraryError::NotFound` when no active record has this id
    async fn replace_tags(&self, id: &str, tags: &TagSet) -> Result<()>;

    /// Mark an active record as deleted
    ///
    /// # Returns
    /// - `Ok(true)` if the record was active and is now deleted
    /// - `Ok(false)` if there was no active record
    async fn soft_delete(&self, id: &str) -> Result<bool>;

    /// Count active records
    async fn count_active(&self) -> Result<i64>;
}

/// SQLite implementation of PlaylistRepository
pub struct SqlitePlaylistRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqlitePlaylistRepository {
    /// Create a repository stamping writes with the system clock
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    fn now(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }

    /// Tag names per playlist id, each list sorted ascending
    async fn load_tags(&self, ids: &[String]) -> Result<HashMap<String, Vec<String>>> {
        let mut tags: HashMap<String, Vec<String>> = HashMap::new();
        if ids.is_empty() {
            return Ok(tags);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT pt.playlist_id, t.name FROM playlist_tags pt \
             JOIN tags t ON t.id = pt.tag_id WHERE pt.playlist_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(") ORDER BY t.name ASC");

        let rows: Vec<(String, String)> = builder.build_query_as().fetch_all(&self.pool).await?;
        for (playlist_id, name) in rows {
            tags.entry(playlist_id).or_default().push(name);
        }

        Ok(tags)
    }

    async fn attach_tags(&self, records: Vec<PlaylistRecord>) -> Result<Vec<TaggedPlaylist>> {
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let mut tags = self.load_tags(&ids).await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let tags = tags.remove(&record.id).unwrap_or_default();
                TaggedPlaylist { record, tags }
            })
            .collect())
    }
}

/// Replace every association of `playlist_id` with `tags`
async fn write_tags(
    conn: &mut SqliteConnection,
    playlist_id: &str,
    tags: &TagSet,
    now: i64,
) -> Result<()> {
    query("DELETE FROM playlist_tags WHERE playlist_id = ?")
        .bind(playlist_id)
        .execute(&mut *conn)
        .await?;

    let resolved = ensure_tags(conn, tags.names(), now).await?;

    for tag in &resolved {
        query("INSERT INTO playlist_tags (playlist_id, tag_id) VALUES (?, ?)")
            .bind(playlist_id)
            .bind(&tag.id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl PlaylistRepository for SqlitePlaylistRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<PlaylistRecord>> {
        let record = query_as::<_, PlaylistRecord>(&format!(
            "SELECT {} FROM playlists p WHERE p.id = ?",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_active_by_id(&self, id: &str) -> Result<Option<TaggedPlaylist>> {
        let record = query_as::<_, PlaylistRecord>(&format!(
            "SELECT {} FROM playlists p WHERE p.id = ? AND p.deleted_at IS NULL",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(self.attach_tags(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filter), fields(owner = ?filter.owner_user_id))]
    async fn find_active_by_filter(
        &self,
        filter: &PlaylistFilter,
        after: Option<&str>,
        limit: u32,
    ) -> Result<CursorPage<TaggedPlaylist, String>> {
        if limit == 0 {
            return Ok(CursorPage::empty());
        }

        // Resolve the cursor id to its position in the ordering
        let position = match after {
            Some(cursor_id) => {
                let row: Option<(i64, String)> =
                    query_as("SELECT updated_at, id FROM playlists WHERE id = ?")
                        .bind(cursor_id)
                        .fetch_optional(&self.pool)
                        .await?;
                match row {
                    Some(position) => Some(position),
                    None => {
                        debug!(cursor = cursor_id, "Unknown cursor, returning empty page");
                        return Ok(CursorPage::empty());
                    }
                }
            }
            None => None,
        };

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM playlists p WHERE p.deleted_at IS NULL",
            RECORD_COLUMNS
        ));

        if let Some(owner) = &filter.owner_user_id {
            builder.push(" AND p.user_id = ").push_bind(owner.clone());
        }

        if let Some(tags) = filter.active_tags() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM playlist_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.playlist_id = p.id AND t.name IN (",
            );
            let mut separated = builder.separated(", ");
            for tag in tags {
                separated.push_bind(tag.clone());
            }
            separated.push_unseparated("))");
        }

        if let Some((updated_at, id)) = position {
            builder
                .push(" AND (p.updated_at < ")
                .push_bind(updated_at)
                .push(" OR (p.updated_at = ")
                .push_bind(updated_at)
                .push(" AND p.id > ")
                .push_bind(id)
                .push("))");
        }

        builder
            .push(" ORDER BY p.updated_at DESC, p.id ASC LIMIT ")
            .push_bind(i64::from(limit) + 1);

        let rows: Vec<PlaylistRecord> = builder.build_query_as().fetch_all(&self.pool).await?;
        let page = CursorPage::from_overfetch(rows, limit as usize, |r| r.id.clone());

        let next_cursor = page.next_cursor;
        let items = self.attach_tags(page.items).await?;

        debug!(
            rows = items.len(),
            has_next = next_cursor.is_some(),
            "Loaded active playlists"
        );

        Ok(CursorPage::new(items, next_cursor))
    }

    async fn active_ids_for_owner(&self, user_id: &str) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> =
            query_as("SELECT id FROM playlists WHERE user_id = ? AND deleted_at IS NULL")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    #[instrument(skip(self, tags), fields(tag_count = tags.len()))]
    async fn create_or_restore(
        &self,
        id: &str,
        user_id: &str,
        tags: &TagSet,
    ) -> Result<SubmitOutcome> {
        let now = self.now();
        let mut tx = self.pool.begin().await?;

        // Open with a write so the transaction holds the write lock before it
        // reads; a read-then-write upgrade fails with SQLITE_BUSY under WAL.
        let inserted = query(
            "INSERT INTO playlists (id, user_id, deleted_at, created_at, updated_at) \
             VALUES (?, ?, NULL, ?, ?) ON CONFLICT(id) DO NOTHING",
        )
        .bind(id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let outcome = if inserted.rows_affected() == 1 {
            SubmitOutcome::Created
        } else {
            let (deleted_at,): (Option<i64>,) =
                query_as("SELECT deleted_at FROM playlists WHERE id = ?")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;

            query("UPDATE playlists SET deleted_at = NULL, updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if deleted_at.is_some() {
                SubmitOutcome::Restored
            } else {
                SubmitOutcome::Resubmitted
            }
        };

        write_tags(&mut tx, id, tags, now).await?;
        tx.commit().await?;

        debug!(?outcome, "Playlist submitted");
        Ok(outcome)
    }

    #[instrument(skip(self, tags), fields(tag_count = tags.len()))]
    async fn replace_tags(&self, id: &str, tags: &TagSet) -> Result<()> {
        let now = self.now();
        let mut tx = self.pool.begin().await?;

        let touched = query(
            "UPDATE playlists SET updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Err(LibraryError::playlist_not_found(id));
        }

        write_tags(&mut tx, id, tags, now).await?;
        tx.commit().await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: &str) -> Result<bool> {
        let now = self.now();
        let result = query(
            "UPDATE playlists SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_active(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) FROM playlists WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::{SqliteTagRepository, TagRepository};
    use bridge_traits::time::ManualClock;

    fn tags(names: &[&str]) -> TagSet {
        TagSet::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    async fn setup() -> (SqlitePlaylistRepository, SqliteTagRepository) {
        let pool = create_test_pool().await.unwrap();
        let clock = Arc::new(ManualClock::new(1_000, 10));
        (
            SqlitePlaylistRepository::with_clock(pool.clone(), clock),
            SqliteTagRepository::new(pool),
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (repo, _) = setup().await;

        let outcome = repo
            .create_or_restore("p1", "u1", &tags(&["rock", "indie"]))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Created);

        let found = repo.find_active_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.record.user_id, "u1");
        assert_eq!(found.tags, vec!["indie", "rock"]);
        assert!(!found.record.is_deleted());
    }

    #[tokio::test]
    async fn test_replace_tags_twice_is_stable() {
        let (repo, tag_repo) = setup().await;
        repo.create_or_restore("p1", "u1", &tags(&["x"])).await.unwrap();

        repo.replace_tags("p1", &tags(&["a", "b"])).await.unwrap();
        repo.replace_tags("p1", &tags(&["a", "b"])).await.unwrap();

        let found = repo.find_active_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.tags, vec!["a", "b"]);
        // "x" stays behind as an orphan, "a" and "b" exist once each
        assert_eq!(tag_repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_replace_tags_requires_active_record() {
        let (repo, _) = setup().await;

        let missing = repo.replace_tags("nope", &tags(&["a"])).await;
        assert!(matches!(missing, Err(LibraryError::NotFound { .. })));

        repo.create_or_restore("p1", "u1", &tags(&["a"])).await.unwrap();
        repo.soft_delete("p1").await.unwrap();
        let deleted = repo.replace_tags("p1", &tags(&["b"])).await;
        assert!(matches!(deleted, Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_row_and_tags() {
        let (repo, _) = setup().await;
        repo.create_or_restore("p1", "u1", &tags(&["a", "b"])).await.unwrap();

        assert!(repo.soft_delete("p1").await.unwrap());
        assert!(!repo.soft_delete("p1").await.unwrap());

        assert!(repo.find_active_by_id("p1").await.unwrap().is_none());
        assert!(repo.active_ids_for_owner("u1").await.unwrap().is_empty());
        assert_eq!(repo.count_active().await.unwrap(), 0);

        let row = repo.find_by_id("p1").await.unwrap().unwrap();
        assert!(row.is_deleted());

        let tag_rows: (i64,) =
            query_as("SELECT COUNT(*) FROM playlist_tags WHERE playlist_id = 'p1'")
                .fetch_one(&repo.pool)
                .await
                .unwrap();
        assert_eq!(tag_rows.0, 2);
    }

    #[tokio::test]
    async fn test_restore_keeps_owner_and_replaces_tags() {
        let (repo, _) = setup().await;
        repo.create_or_restore("p1", "u1", &tags(&["old"])).await.unwrap();
        repo.soft_delete("p1").await.unwrap();

        let outcome = repo
            .create_or_restore("p1", "u2", &tags(&["new", "fresh"]))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Restored);

        let found = repo.find_active_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.record.user_id, "u1");
        assert_eq!(found.tags, vec!["fresh", "new"]);

        let again = repo.create_or_restore("p1", "u1", &tags(&["new"])).await.unwrap();
        assert_eq!(again, SubmitOutcome::Resubmitted);
    }

    #[tokio::test]
    async fn test_listing_order_and_cursor() {
        let (repo, _) = setup().await;
        for id in ["a", "b", "c"] {
            repo.create_or_restore(id, "u1", &tags(&["t"])).await.unwrap();
        }

        // Most recently written first
        let first = repo
            .find_active_by_filter(&PlaylistFilter::new(), None, 2)
            .await
            .unwrap();
        let ids: Vec<_> = first.items.iter().map(|p| p.record.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(first.next_cursor.as_deref(), Some("b"));

        let second = repo
            .find_active_by_filter(&PlaylistFilter::new(), first.next_cursor.as_deref(), 2)
            .await
            .unwrap();
        let ids: Vec<_> = second.items.iter().map(|p| p.record.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_ties_break_on_id() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlitePlaylistRepository::with_clock(pool, Arc::new(ManualClock::frozen(500)));
        for id in ["m", "k", "z", "a"] {
            repo.create_or_restore(id, "u1", &tags(&["t"])).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = repo
                .find_active_by_filter(&PlaylistFilter::new(), cursor.as_deref(), 1)
                .await
                .unwrap();
            seen.extend(page.items.into_iter().map(|p| p.record.id));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen, vec!["a", "k", "m", "z"]);
    }

    #[tokio::test]
    async fn test_filter_by_tags_and_owner() {
        let (repo, _) = setup().await;
        repo.create_or_restore("p1", "u1", &tags(&["jazz"])).await.unwrap();
        repo.create_or_restore("p2", "u2", &tags(&["rock", "jazz"])).await.unwrap();
        repo.create_or_restore("p3", "u1", &tags(&["rock"])).await.unwrap();
        repo.create_or_restore("p4", "u1", &tags(&["ambient"])).await.unwrap();

        let jazz_or_rock = repo
            .find_active_by_filter(
                &PlaylistFilter::new().with_tags(vec!["jazz".into(), "rock".into()]),
                None,
                10,
            )
            .await
            .unwrap();
        let ids: Vec<_> = jazz_or_rock.items.iter().map(|p| p.record.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p2", "p1"]);
        // Matching rows still report their full tag set
        assert_eq!(jazz_or_rock.items[1].tags, vec!["jazz", "rock"]);

        let mine = repo
            .find_active_by_filter(&PlaylistFilter::new().owned_by("u1"), None, 10)
            .await
            .unwrap();
        assert_eq!(mine.len(), 3);

        let none = repo
            .find_active_by_filter(
                &PlaylistFilter::new().with_tags(vec!["JAZZ".into()]),
                None,
                10,
            )
            .await
            .unwrap();
        assert!(none.is_empty());
        assert!(none.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_unknown_cursor_returns_empty_page() {
        let (repo, _) = setup().await;
        repo.create_or_restore("p1", "u1", &tags(&["t"])).await.unwrap();

        let page = repo
            .find_active_by_filter(&PlaylistFilter::new(), Some("ghost"), 5)
            .await
            .unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_active_ids_for_owner() {
        let (repo, _) = setup().await;
        repo.create_or_restore("p1", "u1", &tags(&["t"])).await.unwrap();
        repo.create_or_restore("p2", "u1", &tags(&["t"])).await.unwrap();
        repo.create_or_restore("p3", "u2", &tags(&["t"])).await.unwrap();
        repo.soft_delete("p2").await.unwrap();

        let ids = repo.active_ids_for_owner("u1").await.unwrap();
        assert_eq!(ids, HashSet::from(["p1".to_string()]));
    }
}
