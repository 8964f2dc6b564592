use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use expgate::{
    Res,
    api::{self, HandlerError},
    concur::{CONSUMER_ACCOUNT_HEADER, ConcurClient, Transport, expenses::EXPENSES_PATH},
    config::{ProxyAddress, ProxySettings},
    connectivity::{ProxySelector, StaticDestinations, StaticTenant},
    error::GatewayError,
    management::{AUTH_TOKEN_KEY, MemorySessionStore, SessionStore},
    server::{self, AppState},
    types::{OutboundRequest, SessionToken},
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

const AUTH_URL: &str = "https://auth.concur.test/net2/oauth2/accesstoken.ashx";
const API_URL: &str = "https://api.concur.test/api";
const ENTRIES_XML: &str =
    "<Entries><Entry><Amount>10</Amount></Entry><Entry><Amount>20</Amount></Entry></Entries>";

// Records every request and answers from canned bodies.
#[derive(Clone)]
struct FakeTransport {
    requests: Arc<Mutex<Vec<OutboundRequest>>>,
    auth_body: &'static str,
    expenses_status: Option<u16>,
}

impl FakeTransport {
    fn new() -> Self {
        FakeTransport {
            requests: Arc::new(Mutex::new(Vec::new())),
            auth_body: r#"{"Access_Token":{"Token":"abc123"}}"#,
            expenses_status: None,
        }
    }

    fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn calls_to(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.url == url).count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, request: &OutboundRequest) -> Res<Vec<u8>> {
        self.requests.lock().unwrap().push(request.clone());

        if request.url == AUTH_URL {
            return Ok(self.auth_body.as_bytes().to_vec());
        }
        if let Some(status) = self.expenses_status {
            return Err(GatewayError::Status {
                url: request.url.clone(),
                status,
            });
        }
        Ok(ENTRIES_XML.as_bytes().to_vec())
    }
}

fn destinations(proxy_type: &str) -> StaticDestinations {
    StaticDestinations::new()
        .with(
            "concur-auth",
            [
                ("URL", AUTH_URL),
                ("User", "jdoe"),
                ("Password", "secret"),
                ("X-ConsumerKey", "ck-42"),
                ("ProxyType", proxy_type),
            ],
        )
        .with("concur-api", [("URL", API_URL), ("ProxyType", proxy_type)])
}

fn proxies() -> ProxySelector {
    ProxySelector::new(ProxySettings {
        on_premise: ProxyAddress::new("localhost", "20003"),
        internet: ProxyAddress::default(),
    })
}

fn client(
    destinations: StaticDestinations,
    proxies: ProxySelector,
    transport: &FakeTransport,
) -> ConcurClient {
    ConcurClient::new(
        Arc::new(destinations),
        Arc::new(proxies),
        Arc::new(StaticTenant::new(Some("acme-account".to_string()))),
        Arc::new(transport.clone()),
    )
}

fn state(client: ConcurClient, sessions: &MemorySessionStore) -> AppState {
    AppState::new(client, Arc::new(sessions.clone()))
}

#[tokio::test]
async fn obtain_token_sends_basic_auth_and_consumer_key() {
    let transport = FakeTransport::new();
    let client = client(destinations("Internet"), proxies(), &transport);

    let token = client.obtain_token("concur-auth").await.unwrap();
    assert_eq!(token.as_str(), "OAuth abc123");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let auth = &requests[0];
    assert_eq!(auth.url, AUTH_URL);
    assert_eq!(auth.header_value("Accept"), Some("application/json"));
    assert_eq!(auth.header_value("X-ConsumerKey"), Some("ck-42"));
    // base64("jdoe:secret")
    assert_eq!(auth.header_value("Authorization"), Some("Basic amRvZTpzZWNyZXQ="));
    assert_eq!(auth.proxy, None);
}

#[tokio::test]
async fn unknown_destination_never_reaches_network() {
    let transport = FakeTransport::new();
    let client = client(StaticDestinations::new(), proxies(), &transport);

    let err = client.obtain_token("concur-auth").await.unwrap_err();
    assert!(matches!(err, GatewayError::DestinationNotFound(_)));

    let token = SessionToken::oauth("abc123");
    let err = client.fetch_expenses("concur-api", &token).await.unwrap_err();
    assert!(matches!(err, GatewayError::DestinationNotFound(_)));

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn fetch_expenses_transcodes_entries() {
    let transport = FakeTransport::new();
    let client = client(destinations("Internet"), proxies(), &transport);

    let token = SessionToken::oauth("abc123");
    let json = client.fetch_expenses("concur-api", &token).await.unwrap();

    let value: Value = serde_json::from_str(&json).unwrap();
    let entries = value["Entries"]["Entry"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["Amount"], "10");
    assert_eq!(entries[1]["Amount"], "20");
    assert!(json.contains("\n    \"Entries\""));

    let requests = transport.requests();
    assert_eq!(requests[0].url, format!("{}{}", API_URL, EXPENSES_PATH));
    assert_eq!(requests[0].header_value("Authorization"), Some("OAuth abc123"));
}

#[tokio::test]
async fn on_premise_requests_carry_consumer_account() {
    let transport = FakeTransport::new();
    let client = client(destinations("OnPremise"), proxies(), &transport);

    let token = client.obtain_token("concur-auth").await.unwrap();
    client.fetch_expenses("concur-api", &token).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.header_value(CONSUMER_ACCOUNT_HEADER), Some("acme-account"));
        let proxy = request.proxy.as_ref().unwrap();
        assert_eq!((proxy.host.as_str(), proxy.port), ("localhost", 20003));
    }
}

#[tokio::test]
async fn internet_requests_omit_consumer_account() {
    let transport = FakeTransport::new();
    let client = client(destinations("Internet"), proxies(), &transport);

    let token = client.obtain_token("concur-auth").await.unwrap();
    client.fetch_expenses("concur-api", &token).await.unwrap();

    for request in transport.requests() {
        assert_eq!(request.header_value(CONSUMER_ACCOUNT_HEADER), None);
    }
}

#[tokio::test]
async fn malformed_proxy_port_fails_before_network() {
    let transport = FakeTransport::new();
    let proxies = ProxySelector::new(ProxySettings {
        on_premise: ProxyAddress::new("localhost", "twenty"),
        internet: ProxyAddress::default(),
    });
    let client = client(destinations("OnPremise"), proxies, &transport);

    let err = client.obtain_token("concur-auth").await.unwrap_err();
    assert!(matches!(err, GatewayError::ProxyPort { .. }));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn cached_token_is_reused_within_session() {
    let transport = FakeTransport::new();
    let sessions = MemorySessionStore::new();
    let state = state(client(destinations("Internet"), proxies(), &transport), &sessions);

    api::handle(&state, "session-a").await.unwrap();
    api::handle(&state, "session-a").await.unwrap();

    assert_eq!(transport.calls_to(AUTH_URL), 1);
    assert_eq!(
        sessions.get("session-a", AUTH_TOKEN_KEY).await.as_deref(),
        Some("OAuth abc123")
    );

    // another session authenticates on its own
    api::handle(&state, "session-b").await.unwrap();
    assert_eq!(transport.calls_to(AUTH_URL), 2);
}

#[tokio::test]
async fn idle_session_expires_and_re_authenticates() {
    let transport = FakeTransport::new();
    let sessions = MemorySessionStore::with_idle_timeout(Duration::from_millis(100));
    let state = state(client(destinations("Internet"), proxies(), &transport), &sessions);

    api::handle(&state, "session-a").await.unwrap();
    for i in 0..50 {
        // cookies nobody comes back with
        api::handle(&state, &format!("abandoned{}", i)).await.unwrap();
    }
    assert_eq!(transport.calls_to(AUTH_URL), 51);
    assert_eq!(sessions.session_count().await, 51);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(sessions.session_count().await, 0);

    api::handle(&state, "session-a").await.unwrap();
    assert_eq!(transport.calls_to(AUTH_URL), 52);
    assert_eq!(sessions.session_count().await, 1);
}

#[tokio::test]
async fn preset_session_token_skips_token_provider() {
    let transport = FakeTransport::new();
    let sessions = MemorySessionStore::new();
    sessions.set("session-a", AUTH_TOKEN_KEY, "OAuth cached").await;
    let state = state(client(destinations("Internet"), proxies(), &transport), &sessions);

    api::handle(&state, "session-a").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header_value("Authorization"), Some("OAuth cached"));
}

#[tokio::test]
async fn missing_auth_destination_is_token_creation_error() {
    let transport = FakeTransport::new();
    let sessions = MemorySessionStore::new();
    let state = state(client(StaticDestinations::new(), proxies(), &transport), &sessions);

    let err = api::handle(&state, "s").await.unwrap_err();
    assert_eq!(err, HandlerError::TokenCreation);
    assert!(err.message().contains("Hint"));
    assert_eq!(sessions.get("s", AUTH_TOKEN_KEY).await, None);
}

#[tokio::test]
async fn empty_token_is_rejected_and_not_cached() {
    let mut transport = FakeTransport::new();
    transport.auth_body = r#"{"Access_Token":{"Token":""}}"#;
    let sessions = MemorySessionStore::new();
    let state = state(client(destinations("Internet"), proxies(), &transport), &sessions);

    let err = api::handle(&state, "s").await.unwrap_err();
    assert_eq!(err, HandlerError::InvalidToken);
    assert_eq!(err.message(), "Invalid authentication token.");
    assert_eq!(sessions.get("s", AUTH_TOKEN_KEY).await, None);
    assert_eq!(transport.calls_to(AUTH_URL), 1);
}

#[tokio::test]
async fn rejected_token_is_dropped_from_session() {
    let mut transport = FakeTransport::new();
    transport.expenses_status = Some(401);
    let sessions = MemorySessionStore::new();
    let state = state(client(destinations("Internet"), proxies(), &transport), &sessions);

    let err = api::handle(&state, "s").await.unwrap_err();
    assert_eq!(err, HandlerError::Fetch);
    assert_eq!(sessions.get("s", AUTH_TOKEN_KEY).await, None);
}

#[tokio::test]
async fn other_fetch_failures_keep_token() {
    let mut transport = FakeTransport::new();
    transport.expenses_status = Some(503);
    let sessions = MemorySessionStore::new();
    let state = state(client(destinations("Internet"), proxies(), &transport), &sessions);

    let err = api::handle(&state, "s").await.unwrap_err();
    assert_eq!(err, HandlerError::Fetch);
    assert_eq!(
        sessions.get("s", AUTH_TOKEN_KEY).await.as_deref(),
        Some("OAuth abc123")
    );
}

#[tokio::test]
async fn endpoint_sets_session_cookie_and_returns_json() {
    let transport = FakeTransport::new();
    let sessions = MemorySessionStore::new();
    let router = server::router(state(
        client(destinations("Internet"), proxies(), &transport),
        &sessions,
    ));

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/expenses").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("EXPGATE_SESSION="));
    assert!(cookie.contains("HttpOnly"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["Entries"]["Entry"][1]["Amount"], "20");

    // replaying the cookie reuses the session and its token
    let session_pair = cookie.split(';').next().unwrap().to_string();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/expenses")
                .header(header::COOKIE, session_pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(transport.calls_to(AUTH_URL), 1);
    assert_eq!(sessions.session_count().await, 1);
}

#[tokio::test]
async fn endpoint_failure_is_plain_500() {
    let transport = FakeTransport::new();
    let sessions = MemorySessionStore::new();
    let router = server::router(state(
        client(StaticDestinations::new(), proxies(), &transport),
        &sessions,
    ));

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("Failed to create authentication token."));
    assert!(!text.contains("concur-auth"));
}

#[tokio::test]
async fn health_reports_version() {
    let transport = FakeTransport::new();
    let sessions = MemorySessionStore::new();
    let router = server::router(state(
        client(StaticDestinations::new(), proxies(), &transport),
        &sessions,
    ));

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}
