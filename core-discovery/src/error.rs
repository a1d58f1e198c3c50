use crate::models::Credential;
use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{operation}: {entity_type} {id} not found")]
    NotFound {
        operation: &'static str,
        entity_type: &'static str,
        id: String,
    },

    #[error("{operation}: user {user_id} may not modify playlist {id}")]
    Forbidden {
        operation: &'static str,
        id: String,
        user_id: String,
    },

    #[error("{operation}: remote source failed for {id}: {message}")]
    Upstream {
        operation: &'static str,
        id: String,
        message: String,
    },

    #[error("{operation}: remote source rejected the credential")]
    Unauthenticated { operation: &'static str },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DiscoveryError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn playlist_not_found(operation: &'static str, id: &str) -> Self {
        Self::NotFound {
            operation,
            entity_type: "Playlist",
            id: id.to_string(),
        }
    }

    /// Classify a remote failure. A missing remote resource is still an
    /// upstream failure here; callers that treat it as `NotFound` match on
    /// `BridgeError::NotFound` first. Only a rejected caller token is
    /// `Unauthenticated`.
    pub fn remote(
        operation: &'static str,
        id: &str,
        error: BridgeError,
        credential: Credential<'_>,
    ) -> Self {
        match (error, credential) {
            (BridgeError::Unauthorized(_), Credential::Caller(_)) => {
                Self::Unauthenticated { operation }
            }
            (other, _) => Self::Upstream {
                operation,
                id: id.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<LibraryError> for DiscoveryError {
    fn from(error: LibraryError) -> Self {
        match error {
            LibraryError::InvalidInput { field, message } => Self::Validation { field, message },
            LibraryError::NotFound { id, .. } => Self::NotFound {
                operation: "store",
                entity_type: "Playlist",
                id,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
