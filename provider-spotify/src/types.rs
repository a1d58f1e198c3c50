//! Spotify Web API response types
//!
//! Only the fields the connector reads are modelled; everything else in the
//! payloads is ignored.

use bridge_traits::playlist_source::{
    Image, PlaylistOwner, RemotePlaylist, RemotePlaylistFull, RemoteTrack, UserProfile,
};
use serde::Deserialize;

/// Image object. Spotify sends `null` dimensions for user-uploaded covers.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

impl From<SpotifyImage> for Image {
    fn from(image: SpotifyImage) -> Self {
        Image {
            url: image.url,
            height: image.height,
            width: image.width,
        }
    }
}

/// Public user object, as embedded in playlists or returned by `/users/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// `null` or absent when embedded in a playlist
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<SpotifyImage>,
}

impl From<SpotifyUser> for PlaylistOwner {
    fn from(user: SpotifyUser) -> Self {
        PlaylistOwner {
            id: user.id,
            display_name: user.display_name,
            images: user.images.into_iter().map(Image::from).collect(),
        }
    }
}

impl From<SpotifyUser> for UserProfile {
    fn from(user: SpotifyUser) -> Self {
        UserProfile {
            id: user.id,
            display_name: user.display_name,
            images: user.images.into_iter().map(Image::from).collect(),
        }
    }
}

/// Simplified playlist object (list items and projected detail)
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    /// Empty strings are normalised to `None`
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<SpotifyImage>,
    pub owner: SpotifyUser,
}

impl From<SpotifyPlaylist> for RemotePlaylist {
    fn from(playlist: SpotifyPlaylist) -> Self {
        RemotePlaylist {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description.filter(|d| !d.is_empty()),
            images: playlist.images.into_iter().map(Image::from).collect(),
            owner: playlist.owner.into(),
        }
    }
}

/// `GET /me/playlists` response (paging object)
#[derive(Debug, Deserialize)]
pub struct PlaylistsPage {
    pub items: Vec<SpotifyPlaylist>,
    /// Absolute URL of the next page, `null` on the last page
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
}

/// `GET /playlists/{id}?fields=owner.id` response
#[derive(Debug, Deserialize)]
pub struct OwnerOnly {
    pub owner: OwnerId,
}

#[derive(Debug, Deserialize)]
pub struct OwnerId {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyTrack {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub album: Option<SpotifyAlbum>,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistTrackItem {
    #[serde(default)]
    pub added_at: Option<String>,
    /// `null` for tracks removed from the catalogue
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistTracks {
    #[serde(default)]
    pub items: Vec<PlaylistTrackItem>,
    #[serde(default)]
    pub total: u32,
}

/// `GET /playlists/{id}` response (full playlist object)
#[derive(Debug, Deserialize)]
pub struct SpotifyPlaylistFull {
    #[serde(flatten)]
    pub playlist: SpotifyPlaylist,
    pub tracks: PlaylistTracks,
}

impl From<SpotifyPlaylistFull> for RemotePlaylistFull {
    fn from(full: SpotifyPlaylistFull) -> Self {
        let total_tracks = full.tracks.total;
        let tracks = full
            .tracks
            .items
            .into_iter()
            .filter_map(|item| {
                let added_at = item.added_at;
                item.track.map(|track| RemoteTrack {
                    id: track.id,
                    name: track.name,
                    artists: track.artists.into_iter().map(|a| a.name).collect(),
                    album: track.album.map(|a| a.name),
                    duration_ms: track.duration_ms,
                    added_at,
                })
            })
            .collect();

        RemotePlaylistFull {
            playlist: full.playlist.into(),
            tracks,
            total_tracks,
        }
    }
}

/// Error envelope: `{"error": {"status": 404, "message": "..."}}`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
