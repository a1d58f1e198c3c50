//! # Spotify Provider
//!
//! Implements the `PlaylistSource` trait for the Spotify Web API.
//!
//! ## Overview
//!
//! This module provides:
//! - Offset-paginated listing of the current user's playlists, with the
//!   next offset taken from the response's `next` link
//! - Playlist detail with field projection, full playlists with tracks
//! - Public user profiles (owner avatars for the detail view)
//!
//! The connector holds no credentials; every call receives the bearer token.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::SpotifyConnector;
pub use error::{Result, SpotifyError};
