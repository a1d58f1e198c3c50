//! Spotify Web API connector implementation
//!
//! Implements the `PlaylistSource` trait on top of the host `HttpClient`.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::playlist_source::{
    PlaylistSource, RemotePlaylist, RemotePlaylistFull, RemotePlaylistPage, UserProfile,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{Result, SpotifyError};
use crate::types::{
    ErrorEnvelope, OwnerOnly, PlaylistsPage, SpotifyPlaylist, SpotifyPlaylistFull, SpotifyUser,
};

/// Spotify Web API base URL
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Maximum page size accepted by `/me/playlists`
pub const MAX_PAGE_SIZE: u32 = 50;

/// Fields requested for playlist summaries
const PLAYLIST_FIELDS: &str = "id,name,description,images,owner";

/// Fields requested when only ownership matters
const OWNER_FIELDS: &str = "owner.id";

/// Spotify Web API connector
///
/// Stateless apart from the HTTP client: the bearer token travels with every
/// call, so one connector serves every user.
///
/// # Example
///
/// ```ignore
/// use provider_spotify::SpotifyConnector;
/// use bridge_traits::PlaylistSource;
///
/// let connector = SpotifyConnector::new(http_client);
/// let page = connector.list_owned_playlists(5, 0, &token).await?;
/// ```
pub struct SpotifyConnector {
    http_client: Arc<dyn HttpClient>,
    api_base: String,
    request_timeout: Duration,
}

impl SpotifyConnector {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http_client, SPOTIFY_API_BASE)
    }

    /// Create a connector against a different API root (proxies, tests)
    pub fn with_base_url(http_client: Arc<dyn HttpClient>, api_base: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn get(&self, path: &str, access_token: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}{}", self.api_base, path))
            .header("Accept", "application/json")
            .bearer_token(access_token)
            .timeout(self.request_timeout)
    }

    /// Send a request and map error statuses
    async fn send(
        &self,
        request: HttpRequest,
        resource: &'static str,
        id: &str,
    ) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;
        let status = response.status;

        if response.is_success() {
            return Ok(response);
        }

        let message = Self::error_message(&response);
        warn!(status, resource, id, message = %message, "Spotify request failed");

        Err(match status {
            401 => SpotifyError::Unauthorized(message),
            404 => SpotifyError::NotFound {
                resource,
                id: id.to_string(),
            },
            429 => SpotifyError::RateLimitExceeded {
                retry_after_seconds: response
                    .retry_after()
                    .map(|wait| wait.as_secs())
                    .unwrap_or(0),
            },
            _ => SpotifyError::ApiError {
                status_code: status,
                message,
            },
        })
    }

    fn decode<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
        serde_json::from_slice(&response.body)
            .map_err(|e| SpotifyError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }

    fn error_message(response: &HttpResponse) -> String {
        match serde_json::from_slice::<ErrorEnvelope>(&response.body) {
            Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
            _ => response.text(),
        }
    }

    /// Extract the `offset` query parameter of a paging `next` link
    ///
    /// A missing link means the listing is exhausted. A link without an
    /// offset, or one that does not move past `current_offset`, is rejected
    /// because following it would loop forever.
    pub fn parse_next_offset(next: Option<&str>, current_offset: u32) -> Result<Option<u32>> {
        let Some(next) = next else {
            return Ok(None);
        };

        let url = Url::parse(next)
            .map_err(|e| SpotifyError::InvalidPagination(format!("{}: {}", next, e)))?;

        let offset = url
            .query_pairs()
            .find(|(key, _)| key == "offset")
            .and_then(|(_, value)| value.parse::<u32>().ok())
            .ok_or_else(|| {
                SpotifyError::InvalidPagination(format!("no offset in next link {}", next))
            })?;

        if offset <= current_offset {
            return Err(SpotifyError::InvalidPagination(format!(
                "next offset {} does not advance past {}",
                offset, current_offset
            )));
        }

        Ok(Some(offset))
    }
}

#[async_trait]
impl PlaylistSource for SpotifyConnector {
    #[instrument(skip(self, access_token))]
    async fn list_owned_playlists(
        &self,
        limit: u32,
        offset: u32,
        access_token: &str,
    ) -> BridgeResult<RemotePlaylistPage> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let request = self
            .get("/me/playlists", access_token)
            .query("limit", limit.to_string())
            .query("offset", offset.to_string());

        let response = self.send(request, "Playlists of user", "me").await?;
        let page: PlaylistsPage = Self::decode(&response, "playlist page")?;
        let next_offset = Self::parse_next_offset(page.next.as_deref(), offset)?;

        debug!(
            items = page.items.len(),
            total = page.total,
            ?next_offset,
            "Listed remote playlists"
        );

        Ok(RemotePlaylistPage {
            items: page.items.into_iter().map(RemotePlaylist::from).collect(),
            next_offset,
        })
    }

    #[instrument(skip(self, access_token))]
    async fn get_playlist_detail(
        &self,
        playlist_id: &str,
        access_token: &str,
    ) -> BridgeResult<RemotePlaylist> {
        let request = self
            .get(
                &format!("/playlists/{}", urlencoding::encode(playlist_id)),
                access_token,
            )
            .query("fields", PLAYLIST_FIELDS);

        let response = self.send(request, "Playlist", playlist_id).await?;
        let playlist: SpotifyPlaylist = Self::decode(&response, "playlist")?;

        Ok(playlist.into())
    }

    #[instrument(skip(self, access_token))]
    async fn get_playlist_full(
        &self,
        playlist_id: &str,
        access_token: &str,
    ) -> BridgeResult<RemotePlaylistFull> {
        let request = self.get(
            &format!("/playlists/{}", urlencoding::encode(playlist_id)),
            access_token,
        );

        let response = self.send(request, "Playlist", playlist_id).await?;
        let full: SpotifyPlaylistFull = Self::decode(&response, "full playlist")?;

        Ok(full.into())
    }

    #[instrument(skip(self, access_token))]
    async fn get_playlist_owner_id(
        &self,
        playlist_id: &str,
        access_token: &str,
    ) -> BridgeResult<String> {
        let request = self
            .get(
                &format!("/playlists/{}", urlencoding::encode(playlist_id)),
                access_token,
            )
            .query("fields", OWNER_FIELDS);

        let response = self.send(request, "Playlist", playlist_id).await?;
        let owner: OwnerOnly = Self::decode(&response, "playlist owner")?;

        Ok(owner.owner.id)
    }

    #[instrument(skip(self, access_token))]
    async fn get_user_profile(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> BridgeResult<UserProfile> {
        let request = self.get(
            &format!("/users/{}", urlencoding::encode(user_id)),
            access_token,
        );

        let response = self.send(request, "User", user_id).await?;
        let user: SpotifyUser = Self::decode(&response, "user profile")?;

        Ok(user.into())
    }
}
