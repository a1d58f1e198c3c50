//! # Tag Reconciliation
//!
//! Submission, tag edits and removal of playlists, with ownership checks
//! against the local record. Tag lists are validated before anything is
//! looked up, so a malformed request fails the same way whether or not the
//! playlist exists.

use crate::error::{DiscoveryError, Result};
use core_library::repositories::PlaylistRepository;
use core_library::{LibraryError, SubmitOutcome, TagSet};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct TagReconciler {
    store: Arc<dyn PlaylistRepository>,
}

impl TagReconciler {
    pub fn new(store: Arc<dyn PlaylistRepository>) -> Self {
        Self { store }
    }

    /// Create the record, or reactivate it keeping its original submitter,
    /// and make its tag set exactly `tag_names`.
    #[instrument(skip(self, tag_names))]
    pub async fn create_or_restore_playlist(
        &self,
        id: &str,
        owner_user_id: &str,
        tag_names: Vec<String>,
    ) -> Result<SubmitOutcome> {
        let tags = TagSet::new(tag_names)?;
        let outcome = self.store.create_or_restore(id, owner_user_id, &tags).await?;

        info!(?outcome, tags = tags.len(), "Playlist submitted");
        Ok(outcome)
    }

    /// Atomically replace the tags of an active playlist
    pub async fn set_tags(&self, id: &str, tag_names: Vec<String>) -> Result<()> {
        let tags = TagSet::new(tag_names)?;
        self.replace(id, &tags).await
    }

    /// Replace the tags of a playlist submitted by `requesting_user_id`
    #[instrument(skip(self, tag_names))]
    pub async fn update_tags(
        &self,
        id: &str,
        requesting_user_id: &str,
        tag_names: Vec<String>,
    ) -> Result<()> {
        let tags = TagSet::new(tag_names)?;
        self.authorize("playlists.update", id, requesting_user_id)
            .await?;

        self.replace(id, &tags).await?;
        info!(tags = tags.len(), "Playlist tags replaced");
        Ok(())
    }

    /// Soft-delete a playlist submitted by `requesting_user_id`
    ///
    /// # Errors
    /// - `NotFound` when there is no active record
    /// - `Forbidden` when someone else submitted it
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: &str, requesting_user_id: &str) -> Result<()> {
        self.authorize("playlists.delete", id, requesting_user_id)
            .await?;

        if !self.store.soft_delete(id).await? {
            // Deleted concurrently between the check and the write
            return Err(DiscoveryError::playlist_not_found("playlists.delete", id));
        }

        info!("Playlist removed");
        Ok(())
    }

    async fn replace(&self, id: &str, tags: &TagSet) -> Result<()> {
        self.store.replace_tags(id, tags).await.map_err(|e| match e {
            LibraryError::NotFound { .. } => {
                DiscoveryError::playlist_not_found("playlists.update", id)
            }
            other => other.into(),
        })
    }

    async fn authorize(
        &self,
        operation: &'static str,
        id: &str,
        requesting_user_id: &str,
    ) -> Result<()> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .filter(|record| !record.is_deleted())
            .ok_or_else(|| DiscoveryError::playlist_not_found(operation, id))?;

        if !record.is_owned_by(requesting_user_id) {
            return Err(DiscoveryError::Forbidden {
                operation,
                id: id.to_string(),
                user_id: requesting_user_id.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::db::create_test_pool;
    use core_library::{
        PlaylistFilter, SqlitePlaylistRepository, SqliteTagRepository, TagRepository,
    };

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn setup() -> (TagReconciler, Arc<SqlitePlaylistRepository>, SqliteTagRepository) {
        let pool = create_test_pool().await.unwrap();
        let store = Arc::new(SqlitePlaylistRepository::new(pool.clone()));
        (
            TagReconciler::new(store.clone()),
            store,
            SqliteTagRepository::new(pool),
        )
    }

    #[tokio::test]
    async fn test_set_tags_twice_leaves_exact_set() {
        let (reconciler, store, tags) = setup().await;
        reconciler
            .create_or_restore_playlist("p1", "u1", names(&["x"]))
            .await
            .unwrap();

        reconciler.set_tags("p1", names(&["a", "b"])).await.unwrap();
        reconciler.set_tags("p1", names(&["a", "b"])).await.unwrap();

        let found = store.find_active_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.tags, names(&["a", "b"]));
        assert_eq!(tags.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_tags_are_rejected() {
        let (reconciler, store, _) = setup().await;
        reconciler
            .create_or_restore_playlist("p1", "u1", names(&["x"]))
            .await
            .unwrap();

        let result = reconciler.set_tags("p1", names(&["a", "a"])).await;
        assert!(matches!(result, Err(DiscoveryError::Validation { .. })));

        let found = store.find_active_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.tags, names(&["x"]));
    }

    #[tokio::test]
    async fn test_validation_precedes_lookup() {
        let (reconciler, _, _) = setup().await;

        let result = reconciler.update_tags("missing", "u1", vec![]).await;
        assert!(matches!(result, Err(DiscoveryError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let (reconciler, store, _) = setup().await;
        reconciler
            .create_or_restore_playlist("p1", "owner", names(&["x"]))
            .await
            .unwrap();

        let update = reconciler.update_tags("p1", "intruder", names(&["y"])).await;
        assert!(matches!(update, Err(DiscoveryError::Forbidden { .. })));

        let delete = reconciler.soft_delete("p1", "intruder").await;
        assert!(matches!(delete, Err(DiscoveryError::Forbidden { .. })));

        assert!(store.find_active_by_id("p1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_then_restore() {
        let (reconciler, store, _) = setup().await;
        reconciler
            .create_or_restore_playlist("p1", "u1", names(&["old"]))
            .await
            .unwrap();

        reconciler.soft_delete("p1", "u1").await.unwrap();
        let again = reconciler.soft_delete("p1", "u1").await;
        assert!(matches!(again, Err(DiscoveryError::NotFound { .. })));

        let listing = store
            .find_active_by_filter(&PlaylistFilter::new(), None, 10)
            .await
            .unwrap();
        assert!(listing.is_empty());

        let outcome = reconciler
            .create_or_restore_playlist("p1", "u1", names(&["new"]))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Restored);

        let found = store.find_active_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.tags, names(&["new"]));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (reconciler, _, _) = setup().await;

        let result = reconciler.update_tags("ghost", "u1", names(&["a"])).await;
        assert!(matches!(result, Err(DiscoveryError::NotFound { .. })));
    }
}
