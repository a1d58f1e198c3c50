//! # Repository Pattern Implementation
//!
//! Repository traits and SQLite implementations for the playlist store.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Listings use keyset pagination via [`CursorPage`]
//!
//! ## Available Repositories
//!
//! - `PlaylistRepository` - Submitted playlists, soft deletion and tag sets
//! - `TagRepository` - Tag lookup and search

pub mod pagination;
pub mod playlist;
pub mod tag;

pub use pagination::CursorPage;
pub use playlist::{PlaylistRepository, SqlitePlaylistRepository};
pub use tag::{SqliteTagRepository, TagRepository};
