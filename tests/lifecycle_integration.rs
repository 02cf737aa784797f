//! Integration tests for the token lifecycle
//!
//! Exercises the full authorization-code flow against a mock token endpoint
//! and a mock resource endpoint: exchange, staleness-driven refresh, signed
//! fetches, and the degraded outcomes on endpoint failure.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Duration, Utc};
use lctv_auth::store::{SessionStore, SessionTokenStore, TokenStore};
use lctv_auth::{
    ApiClient, AuthConfig, AuthFailure, Authorization, CallbackContext, Endpoints, TokenLifecycle,
    TokenSet,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_ID: &str = "test_client_id";
const CLIENT_SECRET: &str = "test_secret";
const REDIRECT_URL: &str = "https://app.example/callback";

fn mock_config(server: &MockServer) -> AuthConfig {
    AuthConfig::new(CLIENT_ID, CLIENT_SECRET, REDIRECT_URL).unwrap().endpoints(Endpoints {
        authorize_url: format!("{}/o/authorize/", server.uri()),
        token_url: format!("{}/o/token/", server.uri()),
        api_base: format!("{}/api/", server.uri()),
    })
}

fn session_store() -> Arc<SessionTokenStore> {
    Arc::new(SessionStore::new().for_session(uuid::Uuid::new_v4().to_string()))
}

fn basic_auth_header() -> String {
    format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")))
}

fn token_body(access: &str, refresh: &str, expires_in: i64) -> serde_json::Value {
    serde_json::json!({
        "access_token": access,
        "token_type": "Bearer",
        "refresh_token": refresh,
        "expires_in": expires_in,
        "scope": "read",
    })
}

fn stale_tokens() -> TokenSet {
    TokenSet {
        access_token: "old_access".to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: "old_refresh".to_string(),
        scope: "read".to_string(),
        // 1 hour away: inside the 7200s staleness margin
        expires_at: Utc::now() + Duration::seconds(3600),
    }
}

/// Validates the authorization-code exchange scenario end to end.
///
/// # Test Steps
/// 1. Persist a CSRF state as a prior invocation would
/// 2. Resolve with a matching callback; the mock token endpoint requires the
///    Basic auth header and the code-grant form fields
/// 3. Verify the outcome is `Authorized` with expiry = now + 36000s
/// 4. Verify the store now holds the exchanged record
/// 5. Fetch a resource and verify the `Authorization: Bearer A` signature
#[tokio::test]
async fn test_code_exchange_and_signed_fetch() {
    let server = MockServer::start().await;
    let config = mock_config(&server);
    let store = session_store();
    let lifecycle = TokenLifecycle::new(config.clone(), Arc::clone(&store)).unwrap();

    store.write_csrf_state("s1").await.unwrap();

    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .and(header("Authorization", basic_auth_header().as_str()))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth_code_1"))
        .and(body_string_contains("redirect_uri=https%3A%2F%2Fapp.example%2Fcallback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A", "R", 36000)))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now();
    let outcome =
        lifecycle.resolve(&CallbackContext::from_callback("s1", "auth_code_1")).await.unwrap();

    let tokens = match outcome {
        Authorization::Authorized { tokens, refreshed } => {
            assert!(!refreshed);
            tokens
        }
        other => panic!("expected Authorized, got {other:?}"),
    };

    assert_eq!(tokens.access_token, "A");
    assert_eq!(tokens.refresh_token, "R");
    let lifetime = (tokens.expires_at - before).num_seconds();
    assert!((36000..=36010).contains(&lifetime), "unexpected lifetime {lifetime}");

    // The store is the durable owner of the record
    assert_eq!(store.read_token_set().await.unwrap(), tokens);

    Mock::given(method("GET"))
        .and(path("/api/v1/livestreams/my-channel/"))
        .and(header("Authorization", "Bearer A"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "is_live": true })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&config, store).unwrap();
    assert!(api.channel_is_live("my-channel").await.unwrap());
}

/// Validates the staleness-driven refresh scenario.
///
/// # Test Steps
/// 1. Seed the store with a token set expiring in 1 hour (stale)
/// 2. Resolve without a callback; the mock endpoint requires the refresh
///    grant with the stored refresh token and Basic auth
/// 3. Verify the outcome is `Authorized { refreshed: true }`
/// 4. Verify the store record was replaced wholesale
#[tokio::test]
async fn test_stale_tokens_are_refreshed() {
    let server = MockServer::start().await;
    let store = session_store();
    let lifecycle = TokenLifecycle::new(mock_config(&server), Arc::clone(&store)).unwrap();

    store.write_token_set(&stale_tokens()).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .and(header("Authorization", basic_auth_header().as_str()))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old_refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("new_access", "new_refresh", 36000)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = lifecycle.resolve(&CallbackContext::empty()).await.unwrap();

    match outcome {
        Authorization::Authorized { tokens, refreshed } => {
            assert!(refreshed);
            assert_eq!(tokens.access_token, "new_access");
            assert_eq!(tokens.refresh_token, "new_refresh");
        }
        other => panic!("expected Authorized, got {other:?}"),
    }

    // Whole-record replace: no field of the old record survives
    let stored = store.read_token_set().await.unwrap();
    assert_eq!(stored.access_token, "new_access");
    assert_eq!(stored.refresh_token, "new_refresh");
    assert!(!stored.is_stale());
}

/// Validates that a fresh token set resolves without touching the endpoint.
///
/// # Test Steps
/// 1. Seed a token set with 10 hours of lifetime
/// 2. Resolve; the mock server expects zero requests
#[tokio::test]
async fn test_fresh_tokens_skip_the_endpoint() {
    let server = MockServer::start().await;
    let store = session_store();
    let lifecycle = TokenLifecycle::new(mock_config(&server), Arc::clone(&store)).unwrap();

    let mut tokens = stale_tokens();
    tokens.expires_at = Utc::now() + Duration::seconds(36000);
    store.write_token_set(&tokens).await.unwrap();

    Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

    let outcome = lifecycle.resolve(&CallbackContext::empty()).await.unwrap();
    assert!(outcome.is_authorized());
}

/// Validates the refresh-failure scenario.
///
/// # Test Steps
/// 1. Seed a stale token set
/// 2. The mock endpoint answers `{error: "invalid_grant"}`
/// 3. Verify the outcome degrades to `Unauthenticated` with a typed
///    `AuthFailure::Refresh` and a fresh authorization link
/// 4. Verify the prior store record is left untouched
#[tokio::test]
async fn test_refresh_failure_degrades_without_corruption() {
    let server = MockServer::start().await;
    let store = session_store();
    let lifecycle = TokenLifecycle::new(mock_config(&server), Arc::clone(&store)).unwrap();

    let prior = stale_tokens();
    store.write_token_set(&prior).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "invalid_grant" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = lifecycle.resolve(&CallbackContext::empty()).await.unwrap();

    match outcome {
        Authorization::Unauthenticated { authorize_url, failure } => {
            assert!(matches!(failure, Some(AuthFailure::Refresh(_))));
            assert!(authorize_url.contains("response_type=code"));
        }
        other => panic!("expected Unauthenticated, got {other:?}"),
    }

    // No corruption from the failed refresh
    assert_eq!(store.read_token_set().await.unwrap(), prior);
}

/// Validates the exchange-failure scenario.
///
/// # Test Steps
/// 1. Persist a CSRF state and resolve with a matching callback
/// 2. The mock endpoint answers `{error: "invalid_grant"}`
/// 3. Verify the outcome is `Unauthenticated` with `AuthFailure::Exchange`,
///    no token set is stored, and the CSRF state was rotated for the new
///    link
#[tokio::test]
async fn test_exchange_failure_reissues_link() {
    let server = MockServer::start().await;
    let store = session_store();
    let lifecycle = TokenLifecycle::new(mock_config(&server), Arc::clone(&store)).unwrap();

    store.write_csrf_state("s1").await.unwrap();

    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "invalid_grant" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome =
        lifecycle.resolve(&CallbackContext::from_callback("s1", "bad_code")).await.unwrap();

    match outcome {
        Authorization::Unauthenticated { failure, .. } => {
            assert!(matches!(failure, Some(AuthFailure::Exchange(_))));
        }
        other => panic!("expected Unauthenticated, got {other:?}"),
    }

    assert!(!store.has_token_set().await);
    assert_ne!(store.read_csrf_state().await.unwrap(), "s1");
}

/// Validates the CSRF-mismatch guard at the network seam.
///
/// # Test Steps
/// 1. Persist a CSRF state
/// 2. Resolve with a mismatched callback state; the mock endpoint expects
///    zero requests — the code is never exchanged
#[tokio::test]
async fn test_csrf_mismatch_never_exchanges() {
    let server = MockServer::start().await;
    let store = session_store();
    let lifecycle = TokenLifecycle::new(mock_config(&server), Arc::clone(&store)).unwrap();

    store.write_csrf_state("s1").await.unwrap();

    Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

    let outcome =
        lifecycle.resolve(&CallbackContext::from_callback("attacker", "stolen_code")).await.unwrap();

    assert!(!outcome.is_authorized());
    assert!(!store.has_token_set().await);
}

/// Validates the configurable code-resubmission refresh policy.
///
/// # Test Steps
/// 1. Enable `resubmit_code_on_refresh` and complete an exchange (the code
///    is retained)
/// 2. Age the stored record into staleness
/// 3. Refresh; the mock endpoint requires the original code alongside the
///    refresh token
#[tokio::test]
async fn test_refresh_resubmits_original_code_when_configured() {
    let server = MockServer::start().await;
    let config = mock_config(&server).resubmit_code_on_refresh(true);
    let store = session_store();
    let lifecycle = TokenLifecycle::new(config, Arc::clone(&store)).unwrap();

    store.write_csrf_state("s1").await.unwrap();

    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A", "R", 36000)))
        .expect(1)
        .mount(&server)
        .await;

    let outcome =
        lifecycle.resolve(&CallbackContext::from_callback("s1", "auth_code_1")).await.unwrap();
    assert!(outcome.is_authorized());
    assert_eq!(store.read_authorization_code().await.unwrap(), "auth_code_1");

    // Age the record into the staleness margin
    let mut aged = store.read_token_set().await.unwrap();
    aged.expires_at = Utc::now() + Duration::seconds(3600);
    store.write_token_set(&aged).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R"))
        .and(body_string_contains("code=auth_code_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", "R2", 36000)))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = lifecycle.resolve(&CallbackContext::empty()).await.unwrap();
    match outcome {
        Authorization::Authorized { tokens, refreshed } => {
            assert!(refreshed);
            assert_eq!(tokens.access_token, "A2");
        }
        other => panic!("expected Authorized, got {other:?}"),
    }
}

/// Validates the resource-endpoint error envelope.
///
/// # Test Steps
/// 1. Seed a fresh token set
/// 2. The mock resource endpoint answers a body carrying an `error` field
/// 3. Verify the fetch surfaces `ApiError::Endpoint`, not the raw payload
#[tokio::test]
async fn test_api_error_envelope() {
    let server = MockServer::start().await;
    let config = mock_config(&server);
    let store = session_store();

    let mut tokens = stale_tokens();
    tokens.expires_at = Utc::now() + Duration::seconds(36000);
    store.write_token_set(&tokens).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/livestreams/gone/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "not_found" })),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(&config, store).unwrap();
    let result = api.fetch("v1/livestreams/gone/").await;

    match result {
        Err(lctv_auth::ApiError::Endpoint(body)) => assert_eq!(body.error, "not_found"),
        other => panic!("expected Endpoint error, got {other:?}"),
    }
}
