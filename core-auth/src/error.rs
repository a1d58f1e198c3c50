use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Missing app credentials: {0}")]
    MissingCredentials(String),

    #[error("Auth error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
