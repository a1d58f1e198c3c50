//! Remote Playlist Source Abstraction
//!
//! The third-party playlist service is treated as an opaque oracle with its
//! own offset-based pagination idiom. The aggregator only depends on this
//! trait; `provider-spotify` ships the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Artwork reference (playlist cover or user avatar)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

/// Owner of a remote playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar images. Playlist payloads usually omit them; the detail view
    /// fills them in from the owner's public profile.
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Playlist summary as returned by the remote source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered; the first image is the canonical thumbnail
    #[serde(default)]
    pub images: Vec<Image>,
    pub owner: PlaylistOwner,
}

impl RemotePlaylist {
    /// Canonical thumbnail, if the playlist has any artwork
    pub fn thumbnail(&self) -> Option<&Image> {
        self.images.first()
    }

    /// Whether the playlist belongs to the given remote user
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner.id == user_id
    }
}

/// A track entry of a full playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrack {
    /// Local files and unavailable tracks have no id
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub duration_ms: u64,
    pub added_at: Option<String>,
}

/// Playlist detail including its track listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylistFull {
    #[serde(flatten)]
    pub playlist: RemotePlaylist,
    pub tracks: Vec<RemoteTrack>,
    /// Total track count reported by the source (may exceed `tracks.len()`)
    pub total_tracks: u32,
}

/// Public profile of a remote user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// One raw page of the remote "my playlists" listing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemotePlaylistPage {
    /// Items in remote order, unfiltered
    pub items: Vec<RemotePlaylist>,
    /// Absolute offset of the next page, `None` when the listing is exhausted
    pub next_offset: Option<u32>,
}

/// Remote playlist source
///
/// All calls take the bearer credential explicitly; implementations must not
/// hold ambient session state.
///
/// # Errors
///
/// - `BridgeError::NotFound` when the playlist or user does not exist
/// - `BridgeError::Unauthorized` when the credential is rejected
/// - `BridgeError::OperationFailed` for transport, status or decoding failures
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// List playlists of the user the credential belongs to (followed and
    /// owned, in remote order)
    async fn list_owned_playlists(
        &self,
        limit: u32,
        offset: u32,
        access_token: &str,
    ) -> Result<RemotePlaylistPage>;

    /// Fetch the summary fields of a single playlist
    async fn get_playlist_detail(&self, playlist_id: &str, access_token: &str)
        -> Result<RemotePlaylist>;

    /// Fetch a playlist including its tracks
    async fn get_playlist_full(
        &self,
        playlist_id: &str,
        access_token: &str,
    ) -> Result<RemotePlaylistFull>;

    /// Fetch only the owner id of a playlist
    async fn get_playlist_owner_id(&self, playlist_id: &str, access_token: &str) -> Result<String>;

    /// Fetch a user's public profile
    async fn get_user_profile(&self, user_id: &str, access_token: &str) -> Result<UserProfile>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_playlist_without_optional_fields() {
        let json = r#"{
            "id": "37i9dQZF1DXcBWIGoYBM5M",
            "name": "Today's Top Hits",
            "owner": { "id": "spotify" }
        }"#;

        let playlist: RemotePlaylist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.id, "37i9dQZF1DXcBWIGoYBM5M");
        assert!(playlist.description.is_none());
        assert!(playlist.thumbnail().is_none());
        assert!(playlist.is_owned_by("spotify"));
        assert!(!playlist.is_owned_by("someone-else"));
    }

    #[test]
    fn test_thumbnail_is_first_image() {
        let json = r#"{
            "id": "p1",
            "name": "Mix",
            "description": "Late night",
            "images": [
                { "url": "https://i.scdn.co/large", "height": 640, "width": 640 },
                { "url": "https://i.scdn.co/small", "height": 60, "width": 60 }
            ],
            "owner": { "id": "u1", "display_name": "User One" }
        }"#;

        let playlist: RemotePlaylist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.thumbnail().unwrap().url, "https://i.scdn.co/large");
        assert_eq!(playlist.owner.display_name.as_deref(), Some("User One"));
    }

    #[test]
    fn test_full_playlist_serializes_flat() {
        let full = RemotePlaylistFull {
            playlist: RemotePlaylist {
                id: "p1".to_string(),
                name: "Mix".to_string(),
                description: None,
                images: vec![],
                owner: PlaylistOwner {
                    id: "u1".to_string(),
                    display_name: None,
                    images: vec![],
                },
            },
            tracks: vec![],
            total_tracks: 0,
        };

        let value = serde_json::to_value(&full).unwrap();
        assert_eq!(value["id"], "p1");
        assert_eq!(value["total_tracks"], 0);
    }
}
