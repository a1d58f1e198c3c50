//! # Remote-Driven Pagination
//!
//! Lists the caller's own remote playlists that are not actively submitted
//! yet. The remote listing is the sequence being paged; the local store only
//! contributes the set of ids to skip.
//!
//! ## Cursor
//!
//! The cursor is the count of remote items *consumed*, kept or skipped. When
//! a page fills part-way through a raw remote page, the cursor points just
//! past the last item examined, so the next call resumes exactly there.
//!
//! ## Bound
//!
//! A call fetches at most `max_remote_pages` raw pages. Hitting the bound
//! returns whatever was collected, with the cursor at the first unexamined
//! offset. A short page is valid; callers keep following the cursor.

use crate::error::{DiscoveryError, Result};
use crate::models::Credential;
use bridge_traits::playlist_source::{PlaylistSource, RemotePlaylist};
use core_library::repositories::{CursorPage, PlaylistRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const OPERATION: &str = "me.submittable_playlists";

/// Aggregator for "my submittable playlists"
pub struct SubmittableAggregator {
    store: Arc<dyn PlaylistRepository>,
    source: Arc<dyn PlaylistSource>,
    max_remote_pages: u32,
}

impl SubmittableAggregator {
    pub fn new(
        store: Arc<dyn PlaylistRepository>,
        source: Arc<dyn PlaylistSource>,
        max_remote_pages: u32,
    ) -> Self {
        Self {
            store,
            source,
            max_remote_pages: max_remote_pages.max(1),
        }
    }

    /// Collect up to `limit` submittable playlists starting at remote offset
    /// `cursor` (0 when absent).
    #[instrument(skip(self, access_token))]
    pub async fn page(
        &self,
        owner_user_id: &str,
        cursor: Option<u32>,
        limit: u32,
        access_token: &str,
    ) -> Result<CursorPage<RemotePlaylist, u32>> {
        if limit == 0 {
            return Err(DiscoveryError::validation("limit", "must be at least 1"));
        }

        let submitted = self.store.active_ids_for_owner(owner_user_id).await?;
        let wanted = limit as usize;

        let credential = Credential::Caller(access_token);
        let mut offset = cursor.unwrap_or(0);
        let mut collected: Vec<RemotePlaylist> = Vec::with_capacity(wanted);
        let mut requests = 0u32;

        loop {
            if requests >= self.max_remote_pages {
                debug!(
                    requests,
                    collected = collected.len(),
                    offset,
                    "Remote page budget spent, returning short page"
                );
                return Ok(CursorPage::new(collected, Some(offset)));
            }

            let page_start = offset;
            let page = self
                .source
                .list_owned_playlists(limit, page_start, access_token)
                .await
                .map_err(|e| DiscoveryError::remote(OPERATION, owner_user_id, e, credential))?;
            requests += 1;

            let examined = page.items.len();
            for (index, item) in page.items.into_iter().enumerate() {
                if !is_submittable(&item, owner_user_id, &submitted) {
                    continue;
                }

                collected.push(item);
                if collected.len() == wanted {
                    let consumed = index + 1;
                    let next_cursor = if consumed < examined {
                        Some(page_start + consumed as u32)
                    } else {
                        page.next_offset
                    };
                    debug!(requests, ?next_cursor, "Submittable page filled");
                    return Ok(CursorPage::new(collected, next_cursor));
                }
            }

            match page.next_offset {
                None => {
                    debug!(requests, collected = collected.len(), "Remote listing exhausted");
                    return Ok(CursorPage::new(collected, None));
                }
                Some(next) if next <= page_start => {
                    warn!(page_start, next, "Remote listing did not advance");
                    return Err(DiscoveryError::Upstream {
                        operation: OPERATION,
                        id: owner_user_id.to_string(),
                        message: format!(
                            "next offset {} does not advance past {}",
                            next, page_start
                        ),
                    });
                }
                Some(next) => offset = next,
            }
        }
    }
}

fn is_submittable(item: &RemotePlaylist, owner_user_id: &str, submitted: &HashSet<String>) -> bool {
    item.is_owned_by(owner_user_id) && !submitted.contains(&item.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{playlist, MockPlaylistSource};
    use bridge_traits::error::BridgeError;
    use bridge_traits::playlist_source::RemotePlaylistPage;
    use core_library::db::create_test_pool;
    use core_library::{SqlitePlaylistRepository, TagSet};

    /// Remote listing as (id, owner) pairs, served in raw pages of `page_size`
    fn serve(
        source: &mut MockPlaylistSource,
        listing: Vec<(&'static str, &'static str)>,
        page_size: usize,
    ) {
        source
            .expect_list_owned_playlists()
            .returning(move |_limit, offset, _token| {
                let start = (offset as usize).min(listing.len());
                let end = (start + page_size).min(listing.len());
                let items = listing[start..end]
                    .iter()
                    .map(|(id, owner)| playlist(id, owner))
                    .collect();
                let next_offset = (end < listing.len()).then_some(end as u32);
                Ok(RemotePlaylistPage { items, next_offset })
            });
    }

    async fn empty_store() -> Arc<SqlitePlaylistRepository> {
        Arc::new(SqlitePlaylistRepository::new(create_test_pool().await.unwrap()))
    }

    #[tokio::test]
    async fn test_skips_foreign_and_submitted_playlists() {
        let store = empty_store().await;
        store
            .create_or_restore("mine-2", "me", &TagSet::new(vec!["x".into()]).unwrap())
            .await
            .unwrap();

        let mut source = MockPlaylistSource::new();
        serve(
            &mut source,
            vec![
                ("mine-1", "me"),
                ("theirs", "other"),
                ("mine-2", "me"),
                ("mine-3", "me"),
                ("mine-4", "me"),
            ],
            2,
        );

        let aggregator = SubmittableAggregator::new(store, Arc::new(source), 10);
        let page = aggregator.page("me", None, 2, "t").await.unwrap();

        let ids: Vec<_> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["mine-1", "mine-3"]);
        // mine-3 closes its raw page, so the cursor is the next page's offset
        assert_eq!(page.next_cursor, Some(4));

        let rest = aggregator.page("me", page.next_cursor, 2, "t").await.unwrap();
        let ids: Vec<_> = rest.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["mine-4"]);
        assert_eq!(rest.next_cursor, None);
    }

    #[tokio::test]
    async fn test_cursor_points_inside_partially_consumed_page() {
        let mut source = MockPlaylistSource::new();
        serve(
            &mut source,
            vec![("a", "me"), ("b", "me"), ("c", "me"), ("d", "me"), ("e", "me")],
            5,
        );

        let aggregator = SubmittableAggregator::new(empty_store().await, Arc::new(source), 10);
        let page = aggregator.page("me", Some(1), 2, "t").await.unwrap();

        let ids: Vec<_> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(page.next_cursor, Some(3));
    }

    #[tokio::test]
    async fn test_page_budget_returns_short_page() {
        let mut source = MockPlaylistSource::new();
        serve(
            &mut source,
            vec![
                ("x1", "other"),
                ("x2", "other"),
                ("x3", "other"),
                ("mine", "me"),
            ],
            1,
        );

        let aggregator = SubmittableAggregator::new(empty_store().await, Arc::new(source), 2);
        let page = aggregator.page("me", None, 1, "t").await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.next_cursor, Some(2));

        let page = aggregator.page("me", page.next_cursor, 1, "t").await.unwrap();
        assert_eq!(page.items[0].id, "mine");
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_exact_fill_at_end_of_listing_has_no_cursor() {
        let mut source = MockPlaylistSource::new();
        serve(&mut source, vec![("a", "me"), ("b", "me")], 2);

        let aggregator = SubmittableAggregator::new(empty_store().await, Arc::new(source), 10);
        let page = aggregator.page("me", None, 2, "t").await.unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_non_advancing_listing_is_upstream_error() {
        let mut source = MockPlaylistSource::new();
        source.expect_list_owned_playlists().returning(|_, offset, _| {
            Ok(RemotePlaylistPage {
                items: vec![playlist("theirs", "other")],
                next_offset: Some(offset),
            })
        });

        let aggregator = SubmittableAggregator::new(empty_store().await, Arc::new(source), 10);
        let result = aggregator.page("me", Some(3), 1, "t").await;

        assert!(matches!(result, Err(DiscoveryError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_rejected_token_is_unauthenticated() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_list_owned_playlists()
            .returning(|_, _, _| Err(BridgeError::Unauthorized("expired".to_string())));

        let aggregator = SubmittableAggregator::new(empty_store().await, Arc::new(source), 10);
        let result = aggregator.page("me", None, 5, "t").await;

        assert!(matches!(result, Err(DiscoveryError::Unauthenticated { .. })));
    }
}
