//! Core service façade and bootstrap helpers.
//!
//! This crate wires the configured bridges (HTTP client, remote playlist
//! source, app credentials) and the SQLite store into [`PlaylistService`],
//! the operation surface a transport layer (HTTP, RPC) calls into. Desktop
//! hosts enable the `desktop-shims` feature so `CoreConfig` defaults to the
//! reqwest-backed client.

pub mod api;
pub mod error;
pub mod service;

pub use api::{
    DiscoveryListRequest, Paginated, PlaylistDetail, PlaylistTagsRequest, SubmittableRequest,
    SubmittedRequest,
};
pub use error::{CoreError, Result};
pub use service::{PlaylistService, ServiceDependencies};

use core_auth::{CredentialProvider, RefreshTokenProvider};
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{SqlitePlaylistRepository, SqliteTagRepository};
use core_runtime::config::{CoreConfig, DatabaseLocation};
use core_runtime::logging::strip_path;
use provider_spotify::SpotifyConnector;
use std::sync::Arc;
use tracing::info;

/// Build a ready-to-serve service from configuration.
///
/// Opens (and migrates) the store, points the Spotify connector at the
/// configured API root and, when app credentials are present, sets up the
/// refresh-token provider used for discovery and detail reads.
///
/// ```ignore
/// use core_runtime::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::from_env().build()?;
/// let service = core_service::bootstrap(config).await?;
/// ```
pub async fn bootstrap(config: CoreConfig) -> Result<PlaylistService> {
    config.validate()?;

    let database = match &config.database {
        DatabaseLocation::File(path) => {
            let shown = path.to_string_lossy();
            info!(database = strip_path(&shown), "Opening playlist store");
            DatabaseConfig::new(path)
        }
        DatabaseLocation::InMemory => {
            info!("Opening in-memory playlist store");
            DatabaseConfig::in_memory()
        }
    };
    let pool = create_pool(database).await?;

    let source = SpotifyConnector::with_base_url(
        config.http_client.clone(),
        config.api_base_url.clone(),
    )
    .with_request_timeout(config.request_timeout);

    let app_credentials = config.app_credentials.as_ref().map(|credentials| {
        Arc::new(RefreshTokenProvider::from_app_credentials(
            config.http_client.clone(),
            config.token_url.clone(),
            credentials,
        )) as Arc<dyn CredentialProvider>
    });

    info!(
        api_base = %config.api_base_url,
        app_credentials = app_credentials.is_some(),
        max_remote_pages = config.max_remote_pages,
        "Playlist service ready"
    );

    Ok(PlaylistService::new(ServiceDependencies {
        store: Arc::new(SqlitePlaylistRepository::new(pool.clone())),
        tags: Arc::new(SqliteTagRepository::new(pool)),
        source: Arc::new(source),
        app_credentials,
        max_remote_pages: config.max_remote_pages,
        request_timeout: config.request_timeout,
    }))
}
