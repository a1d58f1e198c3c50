use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The remote service answered, but the requested resource does not exist.
    #[error("Remote resource not found: {0}")]
    NotFound(String),

    /// The remote service rejected the credential.
    #[error("Remote service rejected credentials: {0}")]
    Unauthorized(String),
}

impl BridgeError {
    /// Whether the failure means the remote resource is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, BridgeError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
