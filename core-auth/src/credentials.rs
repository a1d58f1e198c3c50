//! Bearer credential providers for app-level remote reads.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy},
    time::{Clock, SystemClock},
};
use core_runtime::config::AppCredentials;
use core_runtime::logging::redact_if_sensitive;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::types::AccessToken;

/// Refresh this many seconds before the reported expiry
const REFRESH_BUFFER_SECONDS: i64 = 60;

/// Source of bearer tokens for remote calls.
///
/// Implementations return a token that is valid for at least the duration of
/// one request, or fail. They never return an empty string.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Hands out a fixed token.
pub struct StaticCredentialProvider {
    token: String,
}

impl StaticCredentialProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn access_token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(AuthError::NotAuthenticated);
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

struct TokenState {
    cached: Option<AccessToken>,
    refresh_token: String,
}

/// Exchanges the app's refresh token for short-lived access tokens.
///
/// Uses the OAuth 2.0 `refresh_token` grant with HTTP Basic client
/// authentication. The current token is cached and reused until it is within
/// a minute of expiry. Concurrent callers wait on the same refresh instead of
/// each issuing their own.
pub struct RefreshTokenProvider {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    token_url: String,
    client_id: String,
    client_secret: String,
    retry_policy: RetryPolicy,
    state: Mutex<TokenState>,
}

impl RefreshTokenProvider {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            clock: Arc::new(SystemClock),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            retry_policy: RetryPolicy::default(),
            state: Mutex::new(TokenState {
                cached: None,
                refresh_token: refresh_token.into(),
            }),
        }
    }

    /// Build from validated app credentials
    pub fn from_app_credentials(
        http_client: Arc<dyn HttpClient>,
        token_url: impl Into<String>,
        credentials: &AppCredentials,
    ) -> Self {
        Self::new(
            http_client,
            token_url,
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
            credentials.refresh_token.clone(),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn basic_auth_header(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(pair))
    }

    #[instrument(skip(self, refresh_token), fields(token_url = %self.token_url))]
    async fn exchange(&self, refresh_token: &str) -> Result<TokenResponse> {
        let params = [("grant_type", "refresh_token"), ("refresh_token", refresh_token)];
        let request = HttpRequest::new(HttpMethod::Post, self.token_url.clone())
            .header("Authorization", self.basic_auth_header())
            .form(&params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, "Refreshing app access token");

            let response = self
                .http_client
                .execute(request.clone())
                .await
                .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

            if response.is_success() {
                return response.json().map_err(|e| {
                    AuthError::TokenRefreshFailed(format!("Malformed token response: {}", e))
                });
            }

            let status = response.status;
            let error_body = response.text();

            if !response.is_transient() {
                warn!(
                    status = status,
                    error = %redact_if_sensitive("error", &error_body),
                    "Token refresh rejected"
                );
                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token endpoint returned {}",
                    status
                )));
            }

            if attempts >= self.retry_policy.max_attempts.max(1) {
                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts, last status {}",
                    attempts, status
                )));
            }

            let delay = self.retry_policy.delay_after(attempts, response.retry_after());
            warn!(
                status = status,
                attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                "Token refresh failed, retrying"
            );
            sleep(delay).await;
        }
    }
}

#[async_trait]
impl CredentialProvider for RefreshTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(token) = &state.cached {
            if !token.is_expired_at(self.clock.now(), REFRESH_BUFFER_SECONDS) {
                return Ok(token.secret().to_string());
            }
        }

        let response = self.exchange(&state.refresh_token).await?;
        if response.access_token.trim().is_empty() {
            return Err(AuthError::TokenRefreshFailed(
                "Token endpoint returned an empty access token".to_string(),
            ));
        }

        let token = AccessToken::issued(
            response.access_token,
            self.clock.now(),
            response.expires_in,
        );
        info!(expires_at = %token.expires_at, "App access token refreshed");

        if let Some(rotated) = response.refresh_token {
            state.refresh_token = rotated;
        }

        let secret = token.secret().to_string();
        state.cached = Some(token);
        Ok(secret)
    }
}
