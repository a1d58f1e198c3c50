//! # Playlist Library Module
//!
//! Owns the local playlist store: which remote playlists have been submitted,
//! by whom, whether they are soft-deleted, and which tags they carry.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - Repository traits with SQLite implementations for playlists and tags
//! - Keyset cursor pagination over (`updated_at` desc, `id` asc)
//!
//! Remote playlist data (names, images, owners) is never stored here; the
//! store only knows ids, owners, tags and timestamps.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{PlaylistFilter, PlaylistRecord, SubmitOutcome, Tag, TagSet, TaggedPlaylist};
pub use repositories::{
    CursorPage, PlaylistRepository, SqlitePlaylistRepository, SqliteTagRepository, TagRepository,
};
