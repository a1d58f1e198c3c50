//! # Playlist Service
//!
//! The operations a transport layer exposes: discovery listing, the signed-in
//! user's listings, submission, tag edits, removal, playlist detail and tag
//! search.
//!
//! Every operation validates its input, runs under the configured request
//! deadline and reports failures as [`CoreError`], whose `status()` and
//! `public_message()` give the caller-facing answer. Reads that are not made
//! on behalf of a user (discovery, detail) use the app credential; everything
//! under `me.` and every write uses the caller's [`Session`].

use crate::api::{
    DiscoveryListRequest, Paginated, PlaylistDetail, PlaylistTagsRequest, SubmittableRequest,
    SubmittedRequest, MAX_LOCAL_PAGE, MAX_SUBMITTABLE_PAGE, TAG_SEARCH_LIMIT,
};
use crate::error::{CoreError, Result};
use bridge_traits::error::BridgeError;
use bridge_traits::playlist_source::{PlaylistSource, RemotePlaylist};
use core_auth::{CredentialProvider, Session};
use core_discovery::{
    Credential, DiscoveredPlaylist, DiscoveryError, LocalAggregator, SubmittableAggregator,
    TagReconciler,
};
use core_library::repositories::{CursorPage, PlaylistRepository, TagRepository};
use core_library::{PlaylistFilter, SubmitOutcome, TagSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Handles the service needs. Hosts build this directly for tests or custom
/// wiring; [`crate::bootstrap`] builds it from a `CoreConfig`.
pub struct ServiceDependencies {
    pub store: Arc<dyn PlaylistRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub source: Arc<dyn PlaylistSource>,
    /// Mints tokens for reads not made on behalf of a user
    pub app_credentials: Option<Arc<dyn CredentialProvider>>,
    pub max_remote_pages: u32,
    pub request_timeout: Duration,
}

pub struct PlaylistService {
    store: Arc<dyn PlaylistRepository>,
    tags: Arc<dyn TagRepository>,
    source: Arc<dyn PlaylistSource>,
    app_credentials: Option<Arc<dyn CredentialProvider>>,
    local: LocalAggregator,
    submittable: SubmittableAggregator,
    reconciler: TagReconciler,
    request_timeout: Duration,
}

impl PlaylistService {
    pub fn new(deps: ServiceDependencies) -> Self {
        Self {
            local: LocalAggregator::new(deps.store.clone(), deps.source.clone()),
            submittable: SubmittableAggregator::new(
                deps.store.clone(),
                deps.source.clone(),
                deps.max_remote_pages,
            ),
            reconciler: TagReconciler::new(deps.store.clone()),
            store: deps.store,
            tags: deps.tags,
            source: deps.source,
            app_credentials: deps.app_credentials,
            request_timeout: deps.request_timeout,
        }
    }

    /// Active playlists carrying any of the requested tags, newest first
    #[instrument(skip(self, request), fields(limit = request.limit))]
    pub async fn discovery_list(
        &self,
        request: DiscoveryListRequest,
    ) -> Result<Paginated<DiscoveredPlaylist, String>> {
        self.run("discovery.list", self.list_discovery(request)).await
    }

    async fn list_discovery(
        &self,
        request: DiscoveryListRequest,
    ) -> Result<Paginated<DiscoveredPlaylist, String>> {
        validate_limit(request.limit, MAX_LOCAL_PAGE)?;
        let token = self.app_token().await?;

        let filter = PlaylistFilter {
            tag_names: request.tags,
            owner_user_id: None,
        };
        let page = self
            .local
            .page(
                "discovery.list",
                &filter,
                request.cursor.as_deref(),
                request.limit,
                Credential::App(&token),
            )
            .await?;

        Ok(paginated(page))
    }

    /// The caller's own remote playlists that are not submitted yet
    #[instrument(skip(self, session, request), fields(user = %session.user_id, limit = request.limit))]
    pub async fn me_submittable_playlists(
        &self,
        session: &Session,
        request: SubmittableRequest,
    ) -> Result<Paginated<RemotePlaylist, u32>> {
        self.run(
            "me.submittable_playlists",
            self.list_submittable(session, request),
        )
        .await
    }

    async fn list_submittable(
        &self,
        session: &Session,
        request: SubmittableRequest,
    ) -> Result<Paginated<RemotePlaylist, u32>> {
        let token = session.bearer()?;
        validate_limit(request.limit, MAX_SUBMITTABLE_PAGE)?;

        let page = self
            .submittable
            .page(&session.user_id, request.cursor, request.limit, token)
            .await?;

        Ok(paginated(page))
    }

    /// Playlists the caller submitted, newest first
    #[instrument(skip(self, session, request), fields(user = %session.user_id, limit = request.limit))]
    pub async fn me_submitted_playlists(
        &self,
        session: &Session,
        request: SubmittedRequest,
    ) -> Result<Paginated<DiscoveredPlaylist, String>> {
        self.run(
            "me.submitted_playlists",
            self.list_submitted(session, request),
        )
        .await
    }

    async fn list_submitted(
        &self,
        session: &Session,
        request: SubmittedRequest,
    ) -> Result<Paginated<DiscoveredPlaylist, String>> {
        let token = session.bearer()?;
        validate_limit(request.limit, MAX_LOCAL_PAGE)?;

        let filter = PlaylistFilter::new().owned_by(session.user_id.clone());
        let page = self
            .local
            .page(
                "me.submitted_playlists",
                &filter,
                request.cursor.as_deref(),
                request.limit,
                Credential::Caller(token),
            )
            .await?;

        Ok(paginated(page))
    }

    /// Submit one of the caller's remote playlists, or resubmit a removed one
    ///
    /// # Errors
    /// - `NotFound` when the remote playlist does not exist
    /// - `Forbidden` when the caller does not own it remotely
    #[instrument(skip(self, session, request), fields(user = %session.user_id, id = %request.id))]
    pub async fn playlists_create(
        &self,
        session: &Session,
        request: PlaylistTagsRequest,
    ) -> Result<SubmitOutcome> {
        self.run("playlists.create", self.create(session, request)).await
    }

    async fn create(
        &self,
        session: &Session,
        request: PlaylistTagsRequest,
    ) -> Result<SubmitOutcome> {
        const OPERATION: &str = "playlists.create";
        let token = session.bearer()?;
        let credential = Credential::Caller(token);
        validate_id(&request.id)?;
        TagSet::new(request.tags.clone())?;

        let owner_id = self
            .source
            .get_playlist_owner_id(&request.id, token)
            .await
            .map_err(|e| match e {
                BridgeError::NotFound(_) => CoreError::NotFound(format!(
                    "{}: playlist {} does not exist remotely",
                    OPERATION, request.id
                )),
                other => DiscoveryError::remote(OPERATION, &request.id, other, credential).into(),
            })?;

        if owner_id != session.user_id {
            return Err(CoreError::Forbidden(format!(
                "{}: playlist {} belongs to {}",
                OPERATION, request.id, owner_id
            )));
        }

        let outcome = self
            .reconciler
            .create_or_restore_playlist(&request.id, &session.user_id, request.tags)
            .await?;

        Ok(outcome)
    }

    /// Replace the tags of a playlist the caller submitted
    #[instrument(skip(self, session, request), fields(user = %session.user_id, id = %request.id))]
    pub async fn playlists_update(
        &self,
        session: &Session,
        request: PlaylistTagsRequest,
    ) -> Result<()> {
        self.run("playlists.update", self.update(session, request)).await
    }

    async fn update(&self, session: &Session, request: PlaylistTagsRequest) -> Result<()> {
        session.ensure_authenticated()?;
        validate_id(&request.id)?;

        self.reconciler
            .update_tags(&request.id, &session.user_id, request.tags)
            .await?;
        Ok(())
    }

    /// Remove a playlist the caller submitted
    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn playlists_delete(&self, session: &Session, id: &str) -> Result<()> {
        self.run("playlists.delete", self.delete(session, id)).await
    }

    async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.ensure_authenticated()?;
        validate_id(id)?;

        self.reconciler.soft_delete(id, &session.user_id).await?;
        Ok(())
    }

    /// Full playlist with tracks, owner avatars and local tags
    #[instrument(skip(self))]
    pub async fn playlists_by_id(&self, id: &str) -> Result<PlaylistDetail> {
        self.run("playlists.by_id", self.detail(id)).await
    }

    async fn detail(&self, id: &str) -> Result<PlaylistDetail> {
        const OPERATION: &str = "playlists.by_id";
        validate_id(id)?;

        let tagged = self
            .store
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| DiscoveryError::playlist_not_found(OPERATION, id))?;

        let token = self.app_token().await?;
        let credential = Credential::App(&token);
        let mut full = self
            .source
            .get_playlist_full(id, &token)
            .await
            .map_err(|e| DiscoveryError::remote(OPERATION, id, e, credential))?;

        let owner_id = full.playlist.owner.id.clone();
        let profile = self
            .source
            .get_user_profile(&owner_id, &token)
            .await
            .map_err(|e| DiscoveryError::remote(OPERATION, &owner_id, e, credential))?;
        full.playlist.owner.images = profile.images;

        Ok(PlaylistDetail {
            playlist: full,
            tags: tagged.tags,
        })
    }

    /// Up to five tag names in ascending order, optionally containing `query`
    pub async fn tags_search(&self, query: Option<&str>) -> Result<Vec<String>> {
        self.run("tags.search", self.search_tags(query)).await
    }

    async fn search_tags(&self, query: Option<&str>) -> Result<Vec<String>> {
        Ok(self.tags.search(query, TAG_SEARCH_LIMIT).await?)
    }

    async fn app_token(&self) -> Result<String> {
        let provider = self
            .app_credentials
            .as_ref()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "AppCredentials".to_string(),
                message: "set SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET and SPOTIFY_REFRESH_TOKEN"
                    .to_string(),
            })?;

        Ok(provider.access_token().await?)
    }

    /// Apply the request deadline and log failures by class
    async fn run<T, F>(&self, operation: &'static str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = match tokio::time::timeout(self.request_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                operation,
                after: self.request_timeout,
            }),
        };

        if let Err(e) = &result {
            if e.status() >= 500 {
                error!(operation, error = %e, "Request failed");
            } else {
                debug!(operation, status = e.status(), error = %e, "Request rejected");
            }
        }

        result
    }
}

fn validate_limit(limit: u32, max: u32) -> Result<()> {
    if !(1..=max).contains(&limit) {
        return Err(CoreError::validation(
            "limit",
            format!("limit must be between 1 and {}", max),
        ));
    }
    Ok(())
}

fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(CoreError::validation("id", "ID must be included"));
    }
    Ok(())
}

fn paginated<T, C>(page: CursorPage<T, C>) -> Paginated<T, C> {
    Paginated {
        data: page.items,
        cursor: page.next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_limit_bounds() {
        assert!(validate_limit(1, 5).is_ok());
        assert!(validate_limit(5, 5).is_ok());
        assert!(matches!(
            validate_limit(0, 5),
            Err(CoreError::Validation { .. })
        ));
        assert!(validate_limit(6, 5).is_err());
        assert!(validate_limit(11, MAX_LOCAL_PAGE).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("37i9dQZF1DX").is_ok());
        assert_eq!(validate_id("  ").unwrap_err().public_message(), "ID must be included");
    }
}
