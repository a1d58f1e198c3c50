//! # Core Configuration Module
//!
//! Provides configuration management for the playlist tagging core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every dependency and setting the service layer needs.
//! It enforces fail-fast validation so a misconfigured deployment is rejected
//! at startup rather than on the first request.
//!
//! ## Settings
//!
//! - Database location (file path or in-memory)
//! - Remote API base URL and accounts token URL
//! - App credentials (client id, client secret, refresh token) used for
//!   reads that are not tied to a signed-in user
//! - Maximum number of raw remote pages scanned per submittable listing
//! - Per-request timeout
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/var/lib/playlist-tags/app.db")
//!     .app_credentials("client-id", "client-secret", "refresh-token")
//!     .max_remote_pages(5)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! Or from the process environment:
//!
//! ```ignore
//! let config = CoreConfigBuilder::from_env().build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default remote Web API base URL
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Default accounts service token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Default cap on raw remote page fetches per submittable listing call
pub const DEFAULT_MAX_REMOTE_PAGES: u32 = 10;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_REMOTE_PAGES_LIMIT: u32 = 100;
const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Where the local playlist store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// SQLite file on disk (created if missing)
    File(PathBuf),
    /// Private in-memory database, lost on shutdown
    InMemory,
}

impl DatabaseLocation {
    /// Parse a `DATABASE_URL` style value.
    ///
    /// Accepts `sqlite::memory:`, `:memory:`, `sqlite://path`, `sqlite:path`
    /// and bare paths.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value {
            "sqlite::memory:" | ":memory:" => Self::InMemory,
            _ => {
                let path = value
                    .strip_prefix("sqlite://")
                    .or_else(|| value.strip_prefix("sqlite:"))
                    .unwrap_or(value);
                Self::File(PathBuf::from(path))
            }
        }
    }
}

/// Credentials of the registered app itself.
///
/// Used to mint bearer tokens for reads that are not made on behalf of the
/// signed-in user (discovery listing, playlist detail).
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Core configuration for the playlist tagging core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Local playlist store location
    pub database: DatabaseLocation,

    /// Base URL of the remote Web API, without trailing slash
    pub api_base_url: String,

    /// Token endpoint used to exchange the app refresh token
    pub token_url: String,

    /// App credentials (optional; required for discovery and detail reads)
    pub app_credentials: Option<AppCredentials>,

    /// Upper bound on raw remote page fetches in one submittable listing call
    pub max_remote_pages: u32,

    /// Deadline applied to every service operation
    pub request_timeout: Duration,

    /// HTTP client for making API requests
    pub http_client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database", &self.database)
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .field("app_credentials", &self.app_credentials)
            .field("max_remote_pages", &self.max_remote_pages)
            .field("request_timeout", &self.request_timeout)
            .field("http_client", &"HttpClient { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Both remote URLs are absolute http(s) URLs
    /// - App credential fields are not blank
    /// - Page cap and timeout are within range
    pub fn validate(&self) -> Result<()> {
        if let DatabaseLocation::File(path) = &self.database {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        validate_http_url("API base URL", &self.api_base_url)?;
        validate_http_url("Token URL", &self.token_url)?;

        if let Some(credentials) = &self.app_credentials {
            for (name, value) in [
                ("client id", &credentials.client_id),
                ("client secret", &credentials.client_secret),
                ("refresh token", &credentials.refresh_token),
            ] {
                if value.trim().is_empty() {
                    return Err(Error::Config(format!("App {} cannot be blank", name)));
                }
            }
        }

        if self.max_remote_pages == 0 {
            return Err(Error::Config(
                "Max remote pages must be at least 1".to_string(),
            ));
        }

        if self.max_remote_pages > MAX_REMOTE_PAGES_LIMIT {
            return Err(Error::Config(format!(
                "Max remote pages exceeds maximum of {}",
                MAX_REMOTE_PAGES_LIMIT
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(Error::Config(
                "Request timeout exceeds maximum of 5 minutes".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether anonymous (app-level) remote reads are possible
    pub fn has_app_credentials(&self) -> bool {
        self.app_credentials.is_some()
    }
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value)
        .map_err(|e| Error::Config(format!("{} '{}' is not a valid URL: {}", name, value, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Config(format!(
            "{} must use http or https, got '{}'",
            name, other
        ))),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for remote playlist access. \
                 Enable the 'desktop-shims' feature to use the default ReqwestHttpClient \
                 or inject an implementation with .http_client()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to initialize default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

/// Builder for constructing a [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database: Option<DatabaseLocation>,
    api_base_url: Option<String>,
    token_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    max_remote_pages: Option<u32>,
    request_timeout: Option<Duration>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl CoreConfigBuilder {
    /// Seeds a builder from the process environment.
    ///
    /// | Variable | Setting |
    /// |----------|---------|
    /// | `DATABASE_URL` | database location |
    /// | `SPOTIFY_API_BASE` | API base URL |
    /// | `SPOTIFY_CLIENT_ID` | app client id |
    /// | `SPOTIFY_CLIENT_SECRET` | app client secret |
    /// | `SPOTIFY_REFRESH_TOKEN` | app refresh token |
    ///
    /// Unset or empty variables leave the corresponding setting untouched,
    /// so explicit setters can still be chained afterwards.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut builder = Self::default();
        if let Some(url) = get("DATABASE_URL") {
            builder.database = Some(DatabaseLocation::parse(&url));
        }
        builder.api_base_url = get("SPOTIFY_API_BASE");
        builder.client_id = get("SPOTIFY_CLIENT_ID");
        builder.client_secret = get("SPOTIFY_CLIENT_SECRET");
        builder.refresh_token = get("SPOTIFY_REFRESH_TOKEN");
        builder
    }

    /// Sets the SQLite database file path.
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database = Some(DatabaseLocation::File(path.as_ref().to_path_buf()));
        self
    }

    /// Uses a private in-memory database (tests, demos).
    pub fn in_memory_database(mut self) -> Self {
        self.database = Some(DatabaseLocation::InMemory);
        self
    }

    /// Overrides the remote API base URL.
    ///
    /// Default: `https://api.spotify.com/v1`
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Overrides the token endpoint.
    ///
    /// Default: `https://accounts.spotify.com/api/token`
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Sets all three app credential parts at once.
    pub fn app_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the cap on raw remote page fetches per submittable listing.
    ///
    /// Default: 10
    pub fn max_remote_pages(mut self, pages: u32) -> Self {
        self.max_remote_pages = Some(pages);
        self
    }

    /// Sets the per-request timeout.
    ///
    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// - `Error::Config` when the database location is missing, the app
    ///   credentials are only partially set, or any value is out of range
    /// - `Error::CapabilityMissing` when no `HttpClient` is available
    pub fn build(self) -> Result<CoreConfig> {
        let database = self.database.ok_or_else(|| {
            Error::Config(
                "Database location is required. Use .database_path(), .in_memory_database() \
                 or set DATABASE_URL."
                    .to_string(),
            )
        })?;

        let app_credentials = match (self.client_id, self.client_secret, self.refresh_token) {
            (None, None, None) => None,
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(AppCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            (client_id, client_secret, refresh_token) => {
                let missing: Vec<&str> = [
                    ("SPOTIFY_CLIENT_ID", client_id.is_none()),
                    ("SPOTIFY_CLIENT_SECRET", client_secret.is_none()),
                    ("SPOTIFY_REFRESH_TOKEN", refresh_token.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();

                return Err(Error::Config(format!(
                    "App credentials are incomplete, missing: {}",
                    missing.join(", ")
                )));
            }
        };

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let config = CoreConfig {
            database,
            api_base_url: self
                .api_base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            token_url: self
                .token_url
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            app_credentials,
            max_remote_pages: self.max_remote_pages.unwrap_or(DEFAULT_MAX_REMOTE_PAGES),
            request_timeout,
            http_client,
        };

        config.validate()?;

        Ok(config)
    }
}
