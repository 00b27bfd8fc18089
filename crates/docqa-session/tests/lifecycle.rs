//! Integration tests for the session lifecycle against a mock backend.
//!
//! Each test wires a `SessionManager` to a `wiremock` server, a
//! `MemoryTokenStore` it can inspect, and a `ChannelNavigator` whose
//! receiver shows which redirects the session asked for.

use std::time::Duration;

use docqa_session::{
    AuthFailureKind, AuthOutcome, ChannelNavigator, MemoryTokenStore, Route,
    SessionConfig, SessionManager, SessionStatus,
};
use docqa_transport::{ApiClient, ClientConfig, TransportError};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{
    body_json, body_string_contains, header, method, path,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    session: SessionManager,
    store: MemoryTokenStore,
    routes: UnboundedReceiver<Route>,
}

impl Harness {
    fn new(server: &MockServer, store: MemoryTokenStore) -> Self {
        let config = ClientConfig::new(format!("{}/api/v1", server.uri()));
        let client = ApiClient::new(&config).expect("client should build");
        let (navigator, routes) = ChannelNavigator::new();
        let session = SessionManager::new(
            client,
            store.clone(),
            navigator,
            SessionConfig::default(),
        );
        Self {
            session,
            store,
            routes,
        }
    }

    /// Every route signalled so far.
    fn drain_routes(&mut self) -> Vec<Route> {
        let mut seen = Vec::new();
        while let Ok(route) = self.routes.try_recv() {
            seen.push(route);
        }
        seen
    }
}

fn me_body() -> serde_json::Value {
    json!({
        "id": 7,
        "email": "a@x.com",
        "full_name": "Ada",
        "is_active": true,
        "is_superuser": false
    })
}

async fn mount_login_ok(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_string_contains("username=a%40x.com"))
        .and(body_string_contains("password=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

async fn mount_me(server: &MockServer, token: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// initialize
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_initialize_without_token_is_anonymous() {
    let server = MockServer::start().await;
    let mut h = Harness::new(&server, MemoryTokenStore::new());

    let status = h.session.initialize().await;

    assert_eq!(status, SessionStatus::Anonymous);
    assert!(!h.session.is_loading());
    assert!(h.drain_routes().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_initialize_with_valid_token_restores_identity() {
    let server = MockServer::start().await;
    mount_me(&server, "tok1", ResponseTemplate::new(200).set_body_json(me_body())).await;
    let h = Harness::new(&server, MemoryTokenStore::with_token("tok1"));

    let status = h.session.initialize().await;

    assert_eq!(status, SessionStatus::Authenticated);
    let user = h.session.user().expect("identity should be set");
    assert_eq!(user.id, Some(7));
    assert_eq!(user.extra["is_superuser"], json!(false));
    assert_eq!(h.session.token().as_deref(), Some("tok1"));
}

#[tokio::test]
async fn test_initialize_with_rejected_token_clears_everything() {
    let server = MockServer::start().await;
    mount_me(
        &server,
        "expired",
        ResponseTemplate::new(401).set_body_json(
            json!({"detail": "Could not validate credentials"}),
        ),
    )
    .await;
    let mut h = Harness::new(&server, MemoryTokenStore::with_token("expired"));

    let status = h.session.initialize().await;

    assert_eq!(status, SessionStatus::Anonymous);
    assert!(h.store.peek().is_none());
    assert!(!h.session.client().credential().is_installed());
    assert_eq!(h.drain_routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_initialize_with_server_error_never_stays_checking() {
    let server = MockServer::start().await;
    mount_me(&server, "tok1", ResponseTemplate::new(500)).await;
    let h = Harness::new(&server, MemoryTokenStore::with_token("tok1"));

    let status = h.session.initialize().await;

    assert_eq!(status, SessionStatus::Anonymous);
    assert!(h.store.peek().is_none());
}

#[tokio::test]
async fn test_initialize_result_discarded_after_logout() {
    let server = MockServer::start().await;
    mount_me(
        &server,
        "tok1",
        ResponseTemplate::new(200)
            .set_body_json(me_body())
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    let h = Harness::new(&server, MemoryTokenStore::with_token("tok1"));
    let mut updates = h.session.subscribe();

    let session = h.session.clone();
    let pending = tokio::spawn(async move { session.initialize().await });

    updates
        .wait_for(|s| s.status == SessionStatus::Checking)
        .await
        .expect("session should enter checking");
    h.session.logout();

    let status = pending.await.unwrap();

    assert_eq!(status, SessionStatus::Anonymous);
    assert!(h.session.user().is_none());
    assert!(h.store.peek().is_none());
    assert!(!h.session.client().credential().is_installed());
}

#[tokio::test]
async fn test_initialize_when_authenticated_is_noop() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok1").await;
    mount_me(&server, "tok1", ResponseTemplate::new(200).set_body_json(me_body())).await;
    let h = Harness::new(&server, MemoryTokenStore::new());
    h.session.login("a@x.com", "secret").await.unwrap();
    let generation = h.session.snapshot().generation;

    let status = h.session.initialize().await;

    assert_eq!(status, SessionStatus::Authenticated);
    assert_eq!(h.session.snapshot().generation, generation);
}

// ---------------------------------------------------------------------------
// login / register
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_success_authenticates_and_persists() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok1").await;
    mount_me(&server, "tok1", ResponseTemplate::new(200).set_body_json(me_body())).await;
    let mut h = Harness::new(&server, MemoryTokenStore::new());
    h.session.initialize().await;

    let result = h.session.login("a@x.com", "secret").await;

    assert!(result.is_ok());
    assert!(h.session.is_authenticated());
    assert_eq!(h.store.peek().as_deref(), Some("tok1"));
    assert_eq!(h.session.user().unwrap().display_name(), Some("Ada"));
    assert_eq!(h.drain_routes(), vec![Route::Home]);
    assert!(AuthOutcome::from(&result).success);
}

#[tokio::test]
async fn test_login_wrong_credentials_returns_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;
    let mut h = Harness::new(&server, MemoryTokenStore::new());
    h.session.initialize().await;
    let before = h.session.snapshot();

    let failure = h.session.login("a@x.com", "wrong").await.unwrap_err();

    assert_eq!(failure.message, "Invalid credentials");
    assert_eq!(failure.kind, AuthFailureKind::Rejected);
    assert_eq!(h.session.snapshot(), before);
    assert!(h.store.peek().is_none());
    assert!(h.drain_routes().is_empty());
}

#[tokio::test]
async fn test_login_unreachable_backend_uses_fallback() {
    // Port 9 (discard) has nothing listening.
    let config = ClientConfig::new("http://127.0.0.1:9/api/v1");
    let client = ApiClient::new(&config).unwrap();
    let session = SessionManager::new(
        client,
        MemoryTokenStore::new(),
        docqa_session::NoopNavigator,
        SessionConfig::default(),
    );

    let failure = session.login("a@x.com", "secret").await.unwrap_err();

    assert_eq!(failure.kind, AuthFailureKind::Network);
    assert_eq!(failure.message, "Login failed. Please check your credentials.");
    assert_eq!(failure.status, None);
}

#[tokio::test]
async fn test_login_401_does_not_end_existing_session() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok1").await;
    mount_me(&server, "tok1", ResponseTemplate::new(200).set_body_json(me_body())).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_string_contains("username=b%40x.com"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(
                json!({"detail": "Incorrect email or password"}),
            ),
        )
        .mount(&server)
        .await;
    let h = Harness::new(&server, MemoryTokenStore::new());
    h.session.login("a@x.com", "secret").await.unwrap();

    let failure = h.session.login("b@x.com", "nope").await.unwrap_err();

    assert_eq!(failure.message, "Incorrect email or password");
    assert!(h.session.is_authenticated());
    assert_eq!(h.store.peek().as_deref(), Some("tok1"));
}

#[tokio::test]
async fn test_login_rejected_identity_commits_nothing() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok1").await;
    mount_me(&server, "tok1", ResponseTemplate::new(401)).await;
    let mut h = Harness::new(&server, MemoryTokenStore::new());

    let failure = h.session.login("a@x.com", "secret").await.unwrap_err();

    assert_eq!(failure.status, Some(401));
    assert!(!h.session.is_authenticated());
    assert!(h.store.peek().is_none());
    assert!(!h.session.client().credential().is_installed());
    assert!(h.drain_routes().is_empty());
}

#[tokio::test]
async fn test_login_empty_token_is_invalid_response() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "").await;
    let h = Harness::new(&server, MemoryTokenStore::new());

    let failure = h.session.login("a@x.com", "secret").await.unwrap_err();

    assert_eq!(failure.kind, AuthFailureKind::InvalidResponse);
    assert!(h.store.peek().is_none());
}

#[tokio::test]
async fn test_register_posts_json_and_leaves_session_alone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/users/"))
        .and(body_json(json!({
            "email": "a@x.com",
            "password": "secret",
            "full_name": "Ada"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .expect(1)
        .mount(&server)
        .await;
    let h = Harness::new(&server, MemoryTokenStore::new());
    h.session.initialize().await;

    h.session
        .register("a@x.com", "secret", "Ada")
        .await
        .expect("registration should succeed");

    assert_eq!(h.session.status(), SessionStatus::Anonymous);
    assert!(h.store.peek().is_none());
}

#[tokio::test]
async fn test_register_conflict_returns_detail_or_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/users/"))
        .and(body_string_contains("taken@x.com"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Email already registered"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/users/"))
        .and(body_string_contains("other@x.com"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let h = Harness::new(&server, MemoryTokenStore::new());

    let taken = h.session.register("taken@x.com", "pw", "T").await.unwrap_err();
    let broken = h.session.register("other@x.com", "pw", "O").await.unwrap_err();

    assert_eq!(taken.message, "Email already registered");
    assert_eq!(broken.message, "Registration failed. Please try again.");
    assert_eq!(broken.status, Some(500));
}

// ---------------------------------------------------------------------------
// logout / invalidation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_logout_strips_authorization_from_later_requests() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok1").await;
    mount_me(&server, "tok1", ResponseTemplate::new(200).set_body_json(me_body())).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"documents": [], "total": 0})),
        )
        .mount(&server)
        .await;
    let mut h = Harness::new(&server, MemoryTokenStore::new());
    h.session.login("a@x.com", "secret").await.unwrap();

    h.session.logout();
    h.session
        .client()
        .get("documents/")
        .unwrap()
        .execute()
        .await
        .unwrap();

    assert!(h.store.peek().is_none());
    assert_eq!(h.drain_routes(), vec![Route::Home, Route::Login]);
    let requests = server.received_requests().await.unwrap();
    let last = requests.last().unwrap();
    assert_eq!(last.url.path(), "/api/v1/documents/");
    assert!(!last.headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_anonymous_unauthorized_response_redirects_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let mut h = Harness::new(&server, MemoryTokenStore::new());
    h.session.initialize().await;
    let before = h.session.snapshot();

    let err = h
        .session
        .client()
        .get("documents/")
        .unwrap()
        .execute()
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.session.snapshot(), before);
    assert_eq!(h.drain_routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_unauthorized_response_ends_session_and_redirects() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok1").await;
    mount_me(&server, "tok1", ResponseTemplate::new(200).set_body_json(me_body())).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let mut h = Harness::new(&server, MemoryTokenStore::new());
    h.session.login("a@x.com", "secret").await.unwrap();
    h.drain_routes();

    let err = h
        .session
        .client()
        .get("documents/")
        .unwrap()
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Unauthorized { .. }));
    assert_eq!(h.session.status(), SessionStatus::Anonymous);
    assert!(h.store.peek().is_none());
    assert_eq!(h.drain_routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_concurrent_unauthorized_responses_invalidate_once() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok1").await;
    mount_me(&server, "tok1", ResponseTemplate::new(200).set_body_json(me_body())).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/queries/"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(50)))
        .expect(5)
        .mount(&server)
        .await;
    let mut h = Harness::new(&server, MemoryTokenStore::new());
    h.session.login("a@x.com", "secret").await.unwrap();
    h.drain_routes();
    let generation = h.session.snapshot().generation;

    let client = h.session.client().clone();
    let requests = (0..5).map(|_| {
        let client = client.clone();
        async move { client.get("queries/").unwrap().execute().await }
    });
    let results = futures_util::future::join_all(requests).await;

    assert!(results.iter().all(|r| r.as_ref().is_err_and(TransportError::is_unauthorized)));
    assert_eq!(h.session.status(), SessionStatus::Anonymous);
    assert_eq!(h.session.snapshot().generation, generation + 1);
    assert_eq!(h.drain_routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_late_401_for_old_token_spares_new_session() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok2").await;
    mount_me(&server, "tok2", ResponseTemplate::new(200).set_body_json(me_body())).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    let h = Harness::new(&server, MemoryTokenStore::new());
    h.session.client().credential().install("tok1");

    // The old request leaves with tok1, then the user logs in as tok2.
    let client = h.session.client().clone();
    let stale = tokio::spawn(async move { client.get("documents/").unwrap().execute().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.session.login("a@x.com", "secret").await.unwrap();

    let err = stale.await.unwrap().unwrap_err();

    assert!(err.is_unauthorized());
    assert!(h.session.is_authenticated());
    assert_eq!(h.store.peek().as_deref(), Some("tok2"));
}

#[tokio::test]
async fn test_login_logout_sequence_tracks_last_transition() {
    let server = MockServer::start().await;
    mount_login_ok(&server, "tok1").await;
    mount_me(&server, "tok1", ResponseTemplate::new(200).set_body_json(me_body())).await;
    let h = Harness::new(&server, MemoryTokenStore::new());

    h.session.initialize().await;
    assert!(!h.session.is_authenticated());

    h.session.login("a@x.com", "secret").await.unwrap();
    assert!(h.session.is_authenticated());

    h.session.logout();
    assert!(!h.session.is_authenticated());

    h.session.logout();
    assert!(!h.session.is_authenticated());

    h.session.login("a@x.com", "secret").await.unwrap();
    assert!(h.session.is_authenticated());
    assert_eq!(h.store.peek().as_deref(), Some("tok1"));
}
