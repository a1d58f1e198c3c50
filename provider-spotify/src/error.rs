//! Error types for the Spotify provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Spotify provider errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// The access token was rejected (HTTP 401)
    #[error("Spotify rejected the access token: {0}")]
    Unauthorized(String),

    /// Playlist or user does not exist (HTTP 404)
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// Any other non-2xx response
    #[error("Spotify API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The `next` link of a listing is unusable
    #[error("Invalid pagination link: {0}")]
    InvalidPagination(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Spotify operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

impl From<SpotifyError> for BridgeError {
    fn from(error: SpotifyError) -> Self {
        match error {
            SpotifyError::Unauthorized(msg) => BridgeError::Unauthorized(msg),
            SpotifyError::NotFound { resource, id } => {
                BridgeError::NotFound(format!("{} {}", resource, id))
            }
            SpotifyError::BridgeError(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
