//! End-to-end service behaviour against an in-memory store and a mocked
//! remote source.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::playlist_source::{
    Image, PlaylistOwner, PlaylistSource, RemotePlaylist, RemotePlaylistFull, RemotePlaylistPage,
    UserProfile,
};
use bridge_traits::time::ManualClock;
use core_auth::{CredentialProvider, Session, StaticCredentialProvider};
use core_library::db::create_test_pool;
use core_library::{SqlitePlaylistRepository, SqliteTagRepository, SubmitOutcome};
use core_service::{
    CoreError, DiscoveryListRequest, PlaylistService, PlaylistTagsRequest, ServiceDependencies,
    SubmittableRequest, SubmittedRequest,
};
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

mock! {
    PlaylistSource {}

    #[async_trait]
    impl PlaylistSource for PlaylistSource {
        async fn list_owned_playlists(
            &self,
            limit: u32,
            offset: u32,
            access_token: &str,
        ) -> BridgeResult<RemotePlaylistPage>;
        async fn get_playlist_detail(&self, playlist_id: &str, access_token: &str)
            -> BridgeResult<RemotePlaylist>;
        async fn get_playlist_full(&self, playlist_id: &str, access_token: &str)
            -> BridgeResult<RemotePlaylistFull>;
        async fn get_playlist_owner_id(&self, playlist_id: &str, access_token: &str)
            -> BridgeResult<String>;
        async fn get_user_profile(&self, user_id: &str, access_token: &str)
            -> BridgeResult<UserProfile>;
    }
}

fn playlist(id: &str, owner: &str) -> RemotePlaylist {
    RemotePlaylist {
        id: id.to_string(),
        name: format!("Playlist {}", id),
        description: Some("tagged".to_string()),
        images: vec![],
        owner: PlaylistOwner {
            id: owner.to_string(),
            display_name: Some(owner.to_uppercase()),
            images: vec![],
        },
    }
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Remote source where every playlist `<owner>:<name>` belongs to `<owner>`
fn owner_from_id_source() -> MockPlaylistSource {
    let mut source = MockPlaylistSource::new();
    source.expect_get_playlist_owner_id().returning(|id, _| {
        if id.starts_with("missing") {
            return Err(BridgeError::NotFound(format!("Playlist {}", id)));
        }
        Ok(id.split(':').next().unwrap_or_default().to_string())
    });
    source.expect_get_playlist_detail().returning(|id, _| {
        let owner = id.split(':').next().unwrap_or_default();
        Ok(playlist(id, owner))
    });
    source
}

async fn service_with(
    source: impl PlaylistSource + 'static,
    app_credentials: Option<Arc<dyn CredentialProvider>>,
    request_timeout: Duration,
) -> PlaylistService {
    let pool = create_test_pool().await.unwrap();
    PlaylistService::new(ServiceDependencies {
        store: Arc::new(SqlitePlaylistRepository::with_clock(
            pool.clone(),
            Arc::new(ManualClock::new(1_000, 10)),
        )),
        tags: Arc::new(SqliteTagRepository::new(pool)),
        source: Arc::new(source),
        app_credentials,
        max_remote_pages: 10,
        request_timeout,
    })
}

async fn service(source: MockPlaylistSource) -> PlaylistService {
    service_with(
        source,
        Some(Arc::new(StaticCredentialProvider::new("app-token"))),
        Duration::from_secs(5),
    )
    .await
}

fn create(id: &str, names: &[&str]) -> PlaylistTagsRequest {
    PlaylistTagsRequest {
        id: id.to_string(),
        tags: tags(names),
    }
}

#[tokio::test]
async fn test_submit_then_discover_and_list_mine() {
    let service = service(owner_from_id_source()).await;
    let alice = Session::new("alice", "alice-token");
    let bob = Session::new("bob", "bob-token");

    let outcome = service
        .playlists_create(&alice, create("alice:road", &["rock", "indie"]))
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Created);
    service
        .playlists_create(&bob, create("bob:focus", &["lofi"]))
        .await
        .unwrap();

    let discovered = service
        .discovery_list(DiscoveryListRequest {
            limit: 10,
            cursor: None,
            tags: Some(tags(&["rock"])),
        })
        .await
        .unwrap();
    assert_eq!(discovered.data.len(), 1);
    assert_eq!(discovered.data[0].playlist.id, "alice:road");
    assert_eq!(discovered.data[0].tags, tags(&["indie", "rock"]));
    assert!(discovered.cursor.is_none());

    let everything = service
        .discovery_list(DiscoveryListRequest {
            limit: 1,
            cursor: None,
            tags: None,
        })
        .await
        .unwrap();
    assert_eq!(everything.data[0].playlist.id, "bob:focus");
    assert_eq!(everything.cursor.as_deref(), Some("bob:focus"));

    let mine = service
        .me_submitted_playlists(
            &alice,
            SubmittedRequest {
                limit: 10,
                cursor: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(mine.data.len(), 1);
    assert_eq!(mine.data[0].playlist.owner.id, "alice");
}

#[tokio::test]
async fn test_create_checks_remote_existence_and_ownership() {
    let service = service(owner_from_id_source()).await;
    let alice = Session::new("alice", "alice-token");

    let missing = service
        .playlists_create(&alice, create("missing:x", &["a"]))
        .await
        .unwrap_err();
    assert_eq!(missing.status(), 404);

    let foreign = service
        .playlists_create(&alice, create("bob:mix", &["a"]))
        .await
        .unwrap_err();
    assert_eq!(foreign.status(), 403);

    let duplicate = service
        .playlists_create(&alice, create("alice:mix", &["a", "a"]))
        .await
        .unwrap_err();
    assert_eq!(duplicate.status(), 400);
}

#[tokio::test]
async fn test_update_and_delete_require_ownership() {
    let service = service(owner_from_id_source()).await;
    let alice = Session::new("alice", "alice-token");
    let mallory = Session::new("mallory", "mallory-token");

    service
        .playlists_create(&alice, create("alice:road", &["rock"]))
        .await
        .unwrap();

    let update = service
        .playlists_update(&mallory, create("alice:road", &["pop"]))
        .await
        .unwrap_err();
    assert!(matches!(update, CoreError::Forbidden(_)));

    let delete = service
        .playlists_delete(&mallory, "alice:road")
        .await
        .unwrap_err();
    assert_eq!(delete.status(), 403);

    service
        .playlists_update(&alice, create("alice:road", &["pop", "rock"]))
        .await
        .unwrap();
    service.playlists_delete(&alice, "alice:road").await.unwrap();

    let gone = service.playlists_by_id("alice:road").await.unwrap_err();
    assert_eq!(gone.status(), 404);

    let again = service
        .playlists_delete(&alice, "alice:road")
        .await
        .unwrap_err();
    assert_eq!(again.status(), 404);

    let restored = service
        .playlists_create(&alice, create("alice:road", &["jazz"]))
        .await
        .unwrap();
    assert_eq!(restored, SubmitOutcome::Restored);
}

#[tokio::test]
async fn test_limits_are_validated_per_endpoint() {
    let service = service(MockPlaylistSource::new()).await;
    let alice = Session::new("alice", "alice-token");

    for limit in [0, 11] {
        let error = service
            .discovery_list(DiscoveryListRequest {
                limit,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(error.status(), 400);
    }

    let error = service
        .me_submittable_playlists(
            &alice,
            SubmittableRequest {
                limit: 6,
                cursor: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(error.status(), 400);
    assert_eq!(error.public_message(), "limit must be between 1 and 5");
}

#[tokio::test]
async fn test_blank_session_is_unauthenticated() {
    let service = service(MockPlaylistSource::new()).await;
    let anonymous = Session::new("alice", "");

    let error = service
        .me_submittable_playlists(
            &anonymous,
            SubmittableRequest {
                limit: 5,
                cursor: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(error.status(), 401);

    let error = service
        .playlists_delete(&anonymous, "p1")
        .await
        .unwrap_err();
    assert_eq!(error.status(), 401);
}

#[tokio::test]
async fn test_submittable_excludes_submitted() {
    let mut source = owner_from_id_source();
    source
        .expect_list_owned_playlists()
        .returning(|_limit, offset, token| {
            assert_eq!(token, "alice-token");
            let all = vec![
                playlist("alice:one", "alice"),
                playlist("bob:shared", "bob"),
                playlist("alice:two", "alice"),
            ];
            let items = all.into_iter().skip(offset as usize).take(2).collect();
            let next_offset = (offset + 2 < 3).then_some(offset + 2);
            Ok(RemotePlaylistPage { items, next_offset })
        });
    let service = service(source).await;
    let alice = Session::new("alice", "alice-token");

    service
        .playlists_create(&alice, create("alice:one", &["x"]))
        .await
        .unwrap();

    let page = service
        .me_submittable_playlists(
            &alice,
            SubmittableRequest {
                limit: 5,
                cursor: None,
            },
        )
        .await
        .unwrap();

    let ids: Vec<_> = page.data.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["alice:two"]);
    assert!(page.cursor.is_none());
}

#[tokio::test]
async fn test_detail_uses_owner_profile_images() {
    let mut source = owner_from_id_source();
    source.expect_get_playlist_full().returning(|id, token| {
        assert_eq!(token, "app-token");
        Ok(RemotePlaylistFull {
            playlist: playlist(id, "alice"),
            tracks: vec![],
            total_tracks: 0,
        })
    });
    source.expect_get_user_profile().returning(|user_id, _| {
        Ok(UserProfile {
            id: user_id.to_string(),
            display_name: None,
            images: vec![Image {
                url: "https://i.scdn.co/avatar".to_string(),
                height: Some(64),
                width: Some(64),
            }],
        })
    });
    let service = service(source).await;
    let alice = Session::new("alice", "alice-token");

    service
        .playlists_create(&alice, create("alice:road", &["rock"]))
        .await
        .unwrap();

    let detail = service.playlists_by_id("alice:road").await.unwrap();
    assert_eq!(detail.tags, tags(&["rock"]));
    assert_eq!(
        detail.playlist.playlist.owner.images[0].url,
        "https://i.scdn.co/avatar"
    );
}

#[tokio::test]
async fn test_tag_search_returns_five_sorted_names() {
    let service = service(owner_from_id_source()).await;
    let alice = Session::new("alice", "alice-token");

    service
        .playlists_create(
            &alice,
            create("alice:a", &["trance", "techno", "tech house", "dub", "ambient", "trip hop"]),
        )
        .await
        .unwrap();

    let all = service.tags_search(None).await.unwrap();
    assert_eq!(all, tags(&["ambient", "dub", "tech house", "techno", "trance"]));

    let tech = service.tags_search(Some("tech")).await.unwrap();
    assert_eq!(tech, tags(&["tech house", "techno"]));
}

#[tokio::test]
async fn test_discovery_without_app_credentials_is_server_error() {
    let service = service_with(MockPlaylistSource::new(), None, Duration::from_secs(5)).await;

    let error = service
        .discovery_list(DiscoveryListRequest {
            limit: 5,
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(error, CoreError::CapabilityMissing { .. }));
    assert_eq!(error.status(), 500);
    assert_eq!(error.public_message(), "Internal server error");
}

#[tokio::test]
async fn test_rejected_app_token_is_server_error() {
    let mut source = MockPlaylistSource::new();
    source
        .expect_get_playlist_owner_id()
        .returning(|id, token| match token {
            "alice-token" => Ok(id.split(':').next().unwrap_or_default().to_string()),
            _ => Err(BridgeError::Unauthorized("Invalid access token".to_string())),
        });
    source.expect_get_playlist_detail().returning(|_, token| {
        assert_eq!(token, "app-token");
        Err(BridgeError::Unauthorized("The access token expired".to_string()))
    });
    source.expect_get_playlist_full().returning(|_, token| {
        assert_eq!(token, "app-token");
        Err(BridgeError::Unauthorized("The access token expired".to_string()))
    });
    let service = service(source).await;
    let alice = Session::new("alice", "alice-token");

    service
        .playlists_create(&alice, create("alice:road", &["rock"]))
        .await
        .unwrap();

    let listed = service
        .discovery_list(DiscoveryListRequest {
            limit: 5,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(listed, CoreError::Upstream(_)));
    assert_eq!(listed.status(), 500);
    assert_eq!(listed.public_message(), "Internal server error");

    let detail = service.playlists_by_id("alice:road").await.unwrap_err();
    assert!(matches!(detail, CoreError::Upstream(_)));
    assert_eq!(detail.status(), 500);

    // The caller's own token being rejected still asks them to sign in.
    let stale = Session::new("alice", "stale-token");
    let create_error = service
        .playlists_create(&stale, create("alice:mix", &["rock"]))
        .await
        .unwrap_err();
    assert!(matches!(create_error, CoreError::Unauthenticated(_)));
    assert_eq!(create_error.status(), 401);
}

/// Remote source that never answers within a reasonable time
struct StalledSource;

#[async_trait]
impl PlaylistSource for StalledSource {
    async fn list_owned_playlists(
        &self,
        _limit: u32,
        _offset: u32,
        _access_token: &str,
    ) -> BridgeResult<RemotePlaylistPage> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(RemotePlaylistPage::default())
    }

    async fn get_playlist_detail(
        &self,
        id: &str,
        _access_token: &str,
    ) -> BridgeResult<RemotePlaylist> {
        Err(BridgeError::NotAvailable(id.to_string()))
    }

    async fn get_playlist_full(
        &self,
        id: &str,
        _access_token: &str,
    ) -> BridgeResult<RemotePlaylistFull> {
        Err(BridgeError::NotAvailable(id.to_string()))
    }

    async fn get_playlist_owner_id(&self, id: &str, _access_token: &str) -> BridgeResult<String> {
        Err(BridgeError::NotAvailable(id.to_string()))
    }

    async fn get_user_profile(&self, id: &str, _access_token: &str) -> BridgeResult<UserProfile> {
        Err(BridgeError::NotAvailable(id.to_string()))
    }
}

#[tokio::test]
async fn test_request_deadline_abandons_remote_calls() {
    let service = service_with(StalledSource, None, Duration::from_millis(50)).await;
    let alice = Session::new("alice", "alice-token");

    let error = service
        .me_submittable_playlists(
            &alice,
            SubmittableRequest {
                limit: 5,
                cursor: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        CoreError::Timeout {
            operation: "me.submittable_playlists",
            ..
        }
    ));
    assert_eq!(error.status(), 500);
}
