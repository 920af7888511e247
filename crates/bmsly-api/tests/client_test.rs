#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock: token lifecycle,
// the single-retry-on-401 invariant, and endpoint normalization.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bmsly_api::{
    ApiClient, DeviceLogQuery, Error, MemorySessionStore, SessionKey, SessionStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build an unsigned JWT whose payload carries the given `exp`.
fn jwt(exp: i64) -> String {
    let head = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp }).to_string());
    format!("{head}.{payload}.sig")
}

fn live_token() -> String {
    jwt(Utc::now().timestamp() + 3600)
}

fn expired_token() -> String {
    jwt(Utc::now().timestamp() - 60)
}

async fn setup() -> (MockServer, Arc<MemorySessionStore>, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let store = Arc::new(MemorySessionStore::new());
    let client = ApiClient::new(base_url, store.clone()).unwrap();
    (server, store, client)
}

fn seed_session(store: &MemorySessionStore, access: &str, refresh: &str) {
    store.set(SessionKey::AccessToken, access);
    store.set(SessionKey::RefreshToken, refresh);
    store.set(SessionKey::IsLoggedIn, "true");
    store.set(SessionKey::Username, "ops");
}

fn refresh_ok_body(access: &str) -> serde_json::Value {
    json!({ "success": true, "data": { "access": access, "refresh": "rotated-refresh" } })
}

async fn requests_to(server: &MockServer, to: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| req.url.path() == to)
        .count()
}

// ── Retry invariant ─────────────────────────────────────────────────

#[tokio::test]
async fn retry_after_401_issues_exactly_two_calls() {
    let (server, store, client) = setup().await;
    seed_session(&store, &live_token(), "refresh-1");
    let fresh = live_token();

    // First data call is rejected, the replay with the refreshed token
    // succeeds.
    Mock::given(method("GET"))
        .and(path("/admin/slaves/"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_ok_body(&fresh)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/slaves/"))
        .and(header("authorization", format!("Bearer {fresh}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": { "slaves": [{ "id": 1 }] } })),
        )
        .mount(&server)
        .await;

    let slaves = client.slave_list().await.unwrap();

    assert_eq!(slaves.len(), 1);
    assert_eq!(requests_to(&server, "/admin/slaves/").await, 2);
}

#[tokio::test]
async fn second_401_propagates_without_a_third_call() {
    let (server, store, client) = setup().await;
    seed_session(&store, &live_token(), "refresh-1");

    Mock::given(method("GET"))
        .and(path("/admin/slaves/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_ok_body(&live_token())))
        .mount(&server)
        .await;

    let result = client.slave_list().await;

    match result {
        Err(Error::Api { status: 401, .. }) => {}
        other => panic!("expected the second 401 to surface, got: {other:?}"),
    }
    assert_eq!(requests_to(&server, "/admin/slaves/").await, 2);
}

#[tokio::test]
async fn no_token_means_no_request_is_sent() {
    let (server, _store, client) = setup().await;

    let result = client.slave_list().await;

    assert!(matches!(result, Err(Error::NoToken)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Token lifecycle ─────────────────────────────────────────────────

#[tokio::test]
async fn expired_token_refreshes_before_dispatch() {
    let (server, store, client) = setup().await;
    seed_session(&store, &expired_token(), "refresh-1");
    let fresh = live_token();

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_ok_body(&fresh)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/slaves/"))
        .and(header("authorization", format!("Bearer {fresh}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "slaves": [] })))
        .mount(&server)
        .await;

    client.slave_list().await.unwrap();

    // Only the refreshed token ever reached the data endpoint.
    assert_eq!(requests_to(&server, "/admin/slaves/").await, 1);
    assert_eq!(
        store.get(SessionKey::RefreshToken).as_deref(),
        Some("rotated-refresh"),
        "refresh token is rotated in the store"
    );
}

#[tokio::test]
async fn refresh_failure_is_fatal_and_clears_session() {
    let (server, store, client) = setup().await;
    seed_session(&store, &expired_token(), "refresh-1");
    store.set(SessionKey::UserData, "{}");
    store.set(SessionKey::FullUserData, "{}");
    store.set(SessionKey::ActiveApp, "energy");

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": false, "data": null })),
        )
        .mount(&server)
        .await;

    let result = client.slave_list().await;

    match result {
        Err(ref err @ Error::RefreshFailed { .. }) => assert!(err.is_auth_fatal()),
        other => panic!("expected RefreshFailed, got: {other:?}"),
    }
    for key in SessionKey::ALL {
        assert_eq!(store.get(key), None, "{} survived refresh failure", key.as_str());
    }
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let (server, store, client) = setup().await;
    seed_session(&store, &expired_token(), "refresh-1");

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_ok_body(&live_token())))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "slaves": [] })))
        .mount(&server)
        .await;

    // Both calls find an expired token; only one refresh may happen.
    let (a, b) = tokio::join!(client.slave_list(), client.temperature_slaves());
    a.unwrap();
    b.unwrap();
}

// ── Login / logout ──────────────────────────────────────────────────

#[tokio::test]
async fn login_then_slave_list_end_to_end() {
    let (server, store, client) = setup().await;
    let access = live_token();

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "access": access,
                "refresh": "refresh-1",
                "user": { "id": 9, "username": "ops" },
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/slaves/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "slaves": [
                { "slave_id": 1, "slave_name": "Meter-1" },
                { "slave_id": 2, "slave_name": "Meter-2" },
            ]}
        })))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "hunter2".to_string().into();
    let pair = client.login("ops", &secret).await.unwrap();

    assert!(!pair.access.is_empty());
    assert!(store.get(SessionKey::AccessToken).is_some());
    assert!(store.get(SessionKey::RefreshToken).is_some());
    assert_eq!(store.get(SessionKey::IsLoggedIn).as_deref(), Some("true"));
    assert_eq!(store.get(SessionKey::Username).as_deref(), Some("ops"));

    let slaves = client.slave_list().await.unwrap();
    assert_eq!(slaves.len(), 2);
    assert_eq!(slaves[0].name.as_deref(), Some("Meter-1"));
}

#[tokio::test]
async fn login_accepts_top_level_token_fallback() {
    let (server, store, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": live_token(),
            "refresh": "refresh-1",
        })))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "hunter2".to_string().into();
    client.login("ops", &secret).await.unwrap();
    assert!(store.get(SessionKey::AccessToken).is_some());
}

#[tokio::test]
async fn rejected_login_is_an_authentication_error() {
    let (server, _store, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "bad credentials" })),
        )
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = client.login("ops", &secret).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("bad credentials"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn logout_clears_all_seven_keys_even_when_server_fails() {
    let (server, store, client) = setup().await;
    seed_session(&store, &live_token(), "refresh-1");
    store.set(SessionKey::UserData, "{}");
    store.set(SessionKey::FullUserData, "{}");
    store.set(SessionKey::ActiveApp, "temperature");

    Mock::given(method("POST"))
        .and(path("/auth/logout/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    client.logout().await.unwrap();

    for key in SessionKey::ALL {
        assert_eq!(store.get(key), None, "{} survived logout", key.as_str());
    }
}

// ── Endpoint plumbing ───────────────────────────────────────────────

#[tokio::test]
async fn device_logs_pass_pagination_through_and_parse_meta() {
    let (server, store, client) = setup().await;
    seed_session(&store, &live_token(), "refresh-1");

    Mock::given(method("GET"))
        .and(path("/admin/device-logs/"))
        .and(query_param("slave_id", "3"))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "ts": "2025-06-01T00:00:00Z", "kwh": "1.25" } ],
            "meta": { "count": 1, "total": 512, "limit": 50, "offset": 100 },
        })))
        .mount(&server)
        .await;

    let start = chrono::DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let end = chrono::DateTime::parse_from_rfc3339("2025-06-02T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    let page = client
        .device_logs(&DeviceLogQuery {
            slave_id: 3,
            start,
            end,
            limit: 50,
            offset: 100,
        })
        .await
        .unwrap();

    assert_eq!(page.records.len(), 1);
    assert_eq!(page.meta.total, Some(512));
    assert_eq!(page.meta.offset, Some(100));
}

#[tokio::test]
async fn user_profile_falls_back_to_me_endpoint() {
    let (server, store, client) = setup().await;
    seed_session(&store, &live_token(), "refresh-1");

    Mock::given(method("GET"))
        .and(path("/auth/user/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 7, "username": "ops", "email": "ops@vyntar.in" })),
        )
        .mount(&server)
        .await;

    let profile = client.user_profile().await.unwrap();

    assert_eq!(profile.username, "ops");
    assert_eq!(profile.email.as_deref(), Some("ops@vyntar.in"));
    assert!(store.get(SessionKey::FullUserData).is_some());
}

#[tokio::test]
async fn weekly_consumption_coerces_series_values() {
    let (server, store, client) = setup().await;
    seed_session(&store, &live_token(), "refresh-1");

    Mock::given(method("GET"))
        .and(path("/admin/charts/slave/acte-im-consumption-7days/"))
        .and(query_param("slave_id", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "series": [
                { "date": "2025-06-01", "value": "41.5" },
                { "date": "2025-06-02", "value": "abc" },
            ]}
        })))
        .mount(&server)
        .await;

    let series = client.weekly_consumption(5).await.unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].value, 41.5);
    assert_eq!(series[1].value, 0.0, "garbage coerces to zero, not NaN");
}

#[tokio::test]
async fn unrecognized_shape_carries_the_raw_body() {
    let (server, store, client) = setup().await;
    seed_session(&store, &live_token(), "refresh-1");

    Mock::given(method("GET"))
        .and(path("/admin/slaves/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "foo": 1 })))
        .mount(&server)
        .await;

    match client.slave_list().await {
        Err(Error::UnexpectedShape { body }) => assert_eq!(body, json!({ "foo": 1 })),
        other => panic!("expected UnexpectedShape, got: {other:?}"),
    }
}
