use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::error::{AuthError, Result};

/// A bearer token together with its expiry instant.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let token = AccessToken::new("BQD...", now + Duration::hours(1));
///
/// assert!(!token.is_expired_at(now, 300));
/// assert!(token.is_expired_at(now + Duration::minutes(56), 300));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    /// When the token stops being accepted (UTC)
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Build a token that expires `expires_in` seconds after `issued_at`
    pub fn issued(secret: impl Into<String>, issued_at: DateTime<Utc>, expires_in: i64) -> Self {
        Self::new(secret, issued_at + Duration::seconds(expires_in))
    }

    /// The raw bearer value
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Whether the token is expired, or will be within `buffer_seconds`, at
    /// the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        now >= self.expires_at - Duration::seconds(buffer_seconds)
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Identity of the caller for user-scoped operations.
///
/// Session establishment happens outside the core; by the time a `Session`
/// reaches a service call it must carry the remote user id and a bearer token
/// for that user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    access_token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }

    /// The bearer token, or `NotAuthenticated` when the session carries none
    pub fn bearer(&self) -> Result<&str> {
        self.ensure_authenticated()?;
        Ok(&self.access_token)
    }

    /// Fails with `NotAuthenticated` when the user id or token is blank
    pub fn ensure_authenticated(&self) -> Result<()> {
        if self.user_id.trim().is_empty() || self.access_token.trim().is_empty() {
            return Err(AuthError::NotAuthenticated);
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}
