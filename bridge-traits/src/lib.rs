//! # Host Bridge Traits
//!
//! Abstraction traits for the capabilities the core consumes but does not
//! implement itself.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry
//! - [`PlaylistSource`](playlist_source::PlaylistSource) - The third-party
//!   playlist service (offset-paginated listing, detail by id)
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert transport-specific errors into it, keeping "not found" and
//! "unauthorized" distinguishable from generic failures because callers map
//! them to different outcomes.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across concurrent page fetches.

pub mod error;
pub mod http;
pub mod playlist_source;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use playlist_source::{
    Image, PlaylistOwner, PlaylistSource, RemotePlaylist, RemotePlaylistFull, RemotePlaylistPage,
    RemoteTrack, UserProfile,
};
pub use time::{Clock, LogLevel, ManualClock, SystemClock};
