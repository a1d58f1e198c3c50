//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for server and desktop hosts
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest`, with bounded exponential-backoff retries
//!   for rate limiting and transient server errors
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let connector = SpotifyConnector::new(http_client);
//! ```

mod http;

pub use http::ReqwestHttpClient;
