//! # Playlist Discovery Module
//!
//! Presents two very different backing sequences as stable cursor pages.
//!
//! ## Components
//!
//! - **Local aggregator** (`local`): pages through the local store in
//!   (`updated_at` desc, `id` asc) order and enriches rows with remote
//!   summaries. Used by the discovery listing and "my submitted playlists".
//!   The cursor is the id of the last emitted record.
//! - **Submittable aggregator** (`remote`): pages through the remote "my
//!   playlists" listing, skipping playlists owned by someone else or already
//!   submitted. The cursor is a remote offset.
//! - **Tag reconciler** (`tagging`): submission, tag replacement and soft
//!   deletion with ownership checks.
//!
//! The two cursor kinds are never mixed: local pages carry
//! `CursorPage<_, String>` and remote pages `CursorPage<_, u32>`.

pub mod error;
pub mod local;
pub mod models;
pub mod remote;
pub mod tagging;

pub use error::{DiscoveryError, Result};
pub use local::LocalAggregator;
pub use models::{Credential, DiscoveredPlaylist};
pub use remote::SubmittableAggregator;
pub use tagging::TagReconciler;
