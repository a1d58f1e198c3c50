//! Request and response shapes of the service surface.
//!
//! Field names follow the JSON the transport layer exchanges with clients:
//! listings answer `{ "data": [...], "cursor": ... }`.

use bridge_traits::playlist_source::RemotePlaylistFull;
use serde::{Deserialize, Serialize};

/// Largest page of the discovery and "submitted" listings
pub const MAX_LOCAL_PAGE: u32 = 10;

/// Largest page of the "submittable" listing
pub const MAX_SUBMITTABLE_PAGE: u32 = 5;

/// Number of names `tags.search` returns
pub const TAG_SEARCH_LIMIT: u32 = 5;

/// `discovery.list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryListRequest {
    pub limit: u32,
    #[serde(default)]
    pub cursor: Option<String>,
    /// Keep playlists carrying any of these tags; absent or empty keeps all
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// `me.submittable_playlists`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittableRequest {
    pub limit: u32,
    #[serde(default)]
    pub cursor: Option<u32>,
}

/// `me.submitted_playlists`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedRequest {
    pub limit: u32,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// `playlists.create` and `playlists.update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTagsRequest {
    pub id: String,
    pub tags: Vec<String>,
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T, C> {
    pub data: Vec<T>,
    pub cursor: Option<C>,
}

/// `playlists.by_id`: the full remote playlist with owner avatars filled in,
/// plus the local tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: RemotePlaylistFull,
    pub tags: Vec<String>,
}
