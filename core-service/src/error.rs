use core_auth::AuthError;
use core_discovery::DiscoveryError;
use core_library::LibraryError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status a transport layer should answer with
    pub fn status(&self) -> u16 {
        match self {
            CoreError::Validation { .. } => 400,
            CoreError::Unauthenticated(_) => 401,
            CoreError::Forbidden(_) => 403,
            CoreError::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Message safe to show the caller. Server-side failures collapse to a
    /// generic text; the detail only goes to the logs.
    pub fn public_message(&self) -> String {
        match self {
            CoreError::Validation { message, .. } => message.clone(),
            CoreError::Unauthenticated(_) => "Sign in to continue".to_string(),
            CoreError::Forbidden(_) => "You are not allowed to modify this playlist".to_string(),
            CoreError::NotFound(_) => "Playlist not found".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<DiscoveryError> for CoreError {
    fn from(error: DiscoveryError) -> Self {
        match error {
            DiscoveryError::Validation { field, message } => Self::Validation { field, message },
            e @ DiscoveryError::NotFound { .. } => Self::NotFound(e.to_string()),
            e @ DiscoveryError::Forbidden { .. } => Self::Forbidden(e.to_string()),
            e @ DiscoveryError::Unauthenticated { .. } => Self::Unauthenticated(e.to_string()),
            e @ DiscoveryError::Upstream { .. } => Self::Upstream(e.to_string()),
            DiscoveryError::Storage(message) => Self::Internal(message),
        }
    }
}

impl From<LibraryError> for CoreError {
    fn from(error: LibraryError) -> Self {
        DiscoveryError::from(error).into()
    }
}

impl From<AuthError> for CoreError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotAuthenticated => Self::Unauthenticated(error.to_string()),
            AuthError::MissingCredentials(message) => Self::CapabilityMissing {
                capability: "AppCredentials".to_string(),
                message,
            },
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<core_runtime::Error> for CoreError {
    fn from(error: core_runtime::Error) -> Self {
        match error {
            core_runtime::Error::CapabilityMissing {
                capability,
                message,
            } => Self::CapabilityMissing {
                capability,
                message,
            },
            other => Self::InitializationFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(CoreError::validation("limit", "too big").status(), 400);
        assert_eq!(CoreError::Unauthenticated("x".into()).status(), 401);
        assert_eq!(CoreError::Forbidden("x".into()).status(), 403);
        assert_eq!(CoreError::NotFound("x".into()).status(), 404);
        assert_eq!(CoreError::Upstream("x".into()).status(), 500);
        assert_eq!(
            CoreError::Timeout {
                operation: "discovery.list",
                after: Duration::from_secs(1)
            }
            .status(),
            500
        );
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let error = CoreError::Upstream("api.spotify.com returned 502 for p1".into());
        assert_eq!(error.public_message(), "Internal server error");

        let error = CoreError::validation("tags", "Duplicate tag 'a'");
        assert_eq!(error.public_message(), "Duplicate tag 'a'");
    }

    #[test]
    fn test_discovery_errors_keep_their_class() {
        let forbidden: CoreError = DiscoveryError::Forbidden {
            operation: "playlists.delete",
            id: "p1".into(),
            user_id: "u2".into(),
        }
        .into();
        assert_eq!(forbidden.status(), 403);

        let storage: CoreError = DiscoveryError::Storage("disk I/O error".into()).into();
        assert_eq!(storage.status(), 500);

        let auth: CoreError = AuthError::NotAuthenticated.into();
        assert_eq!(auth.status(), 401);

        let refresh: CoreError = AuthError::TokenRefreshFailed("400".into()).into();
        assert_eq!(refresh.status(), 500);
    }
}
