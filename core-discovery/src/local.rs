//! # Local-Store-Driven Pagination
//!
//! Pages through active local records (optionally filtered by tags and
//! submitter) and enriches each row with its remote summary.
//!
//! The store decides membership and order; the remote source only supplies
//! display fields. Summaries for one page are fetched concurrently and
//! joined, so the first failed fetch fails the page and dropping the future
//! abandons every fetch still in flight.

use crate::error::{DiscoveryError, Result};
use crate::models::{Credential, DiscoveredPlaylist};
use bridge_traits::playlist_source::PlaylistSource;
use core_library::repositories::{CursorPage, PlaylistRepository};
use core_library::PlaylistFilter;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Aggregator for the discovery listing and "my submitted playlists"
pub struct LocalAggregator {
    store: Arc<dyn PlaylistRepository>,
    source: Arc<dyn PlaylistSource>,
}

impl LocalAggregator {
    pub fn new(store: Arc<dyn PlaylistRepository>, source: Arc<dyn PlaylistSource>) -> Self {
        Self { store, source }
    }

    /// Fetch one page strictly after the record with id `cursor`
    ///
    /// `operation` names the calling endpoint in error context.
    #[instrument(skip(self, filter), fields(tags = ?filter.tag_names))]
    pub async fn page(
        &self,
        operation: &'static str,
        filter: &PlaylistFilter,
        cursor: Option<&str>,
        limit: u32,
        credential: Credential<'_>,
    ) -> Result<CursorPage<DiscoveredPlaylist, String>> {
        if limit == 0 {
            return Err(DiscoveryError::validation("limit", "must be at least 1"));
        }

        let local = self
            .store
            .find_active_by_filter(filter, cursor, limit)
            .await?;

        if local.is_empty() {
            return Ok(CursorPage::empty());
        }

        let fetches = local.items.iter().map(|tagged| {
            let id = tagged.record.id.as_str();
            async move {
                self.source
                    .get_playlist_detail(id, credential.token())
                    .await
                    .map_err(|e| DiscoveryError::remote(operation, id, e, credential))
            }
        });
        let summaries = try_join_all(fetches).await?;

        debug!(
            rows = summaries.len(),
            has_next = local.has_next(),
            "Enriched local page"
        );

        let rows = local
            .items
            .into_iter()
            .zip(summaries)
            .map(|(tagged, playlist)| DiscoveredPlaylist {
                playlist,
                tags: tagged.tags,
            })
            .collect();

        Ok(CursorPage::new(rows, local.next_cursor))
    }
}
