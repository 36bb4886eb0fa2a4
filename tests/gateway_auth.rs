mod common;

use api_gateway::application::services::FailurePolicy;
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use common::{
    Options, authority_answers, backend_answers, bearer, harness, received_count, token,
};
use std::time::Duration;
use wiremock::matchers::path;
use wiremock::{Mock, ResponseTemplate};

fn message(response: &axum_test::TestResponse) -> String {
    response.json::<serde_json::Value>()["message"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_public_path_needs_no_credential() {
    let h = harness(Options::default()).await;
    backend_answers(&h.backend, 200, r#"{"token":"t"}"#).await;

    let response = h.server.post("/api/auth/login").await;

    response.assert_status_ok();
    assert_eq!(received_count(&h.authority).await, 0);

    let requests = h.backend.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("x-user-id").is_none());
}

#[tokio::test]
async fn test_oauth_subtree_is_public() {
    let h = harness(Options::default()).await;
    backend_answers(&h.backend, 302, "").await;

    let response = h.server.get("/api/auth/oauth/google/callback").await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_protected_path_without_credential_is_rejected() {
    let h = harness(Options::default()).await;
    backend_answers(&h.backend, 200, "secret").await;

    let response = h.server.get("/api/incidents/7").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&response), "Not authenticated");
    assert_eq!(received_count(&h.backend).await, 0);
    assert_eq!(received_count(&h.authority).await, 0);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let h = harness(Options::default()).await;
    let (name, value) = bearer(&token(-60));

    let response = h.server.get("/api/incidents/7").add_header(name, value).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&response), "Token expired");
    assert_eq!(received_count(&h.backend).await, 0);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let h = harness(Options::default()).await;
    let (name, value) = bearer("not-a-jwt");

    let response = h.server.get("/api/incidents/7").add_header(name, value).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&response), "Invalid token format");
}

#[tokio::test]
async fn test_revoked_session_is_rejected() {
    let h = harness(Options::default()).await;
    authority_answers(&h.authority, 401).await;
    backend_answers(&h.backend, 200, "secret").await;
    let (name, value) = bearer(&token(3600));

    let response = h.server.get("/api/incidents/7").add_header(name, value).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&response), "Session is no longer valid");
    assert_eq!(received_count(&h.backend).await, 0);
}

#[tokio::test]
async fn test_active_session_forwards_identity_headers() {
    let h = harness(Options::default()).await;
    authority_answers(&h.authority, 200).await;
    backend_answers(&h.backend, 200, "[]").await;
    let credential = token(3600);
    let (name, value) = bearer(&credential);

    let response = h
        .server
        .get("/api/incidents")
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("spoofed"),
        )
        .await;

    response.assert_status_ok();

    let authority_requests = h.authority.received_requests().await.unwrap();
    assert_eq!(
        authority_requests[0].headers.get("authorization").unwrap(),
        format!("Bearer {credential}").as_str()
    );

    let requests = h.backend.received_requests().await.unwrap();
    let forwarded = &requests[0].headers;
    assert_eq!(forwarded.get("x-user-id").unwrap(), "u-42");
    assert_eq!(forwarded.get("x-user-email").unwrap(), "dana@example.com");
    assert_eq!(forwarded.get("x-user-role").unwrap(), "responder");
    assert_eq!(forwarded.get("x-user-name").unwrap(), "Dana Reyes");
    assert_eq!(forwarded.get_all("x-user-id").iter().count(), 1);
}

#[tokio::test]
async fn test_authority_error_fails_open() {
    let h = harness(Options::default()).await;
    authority_answers(&h.authority, 500).await;
    backend_answers(&h.backend, 200, "ok").await;
    let (name, value) = bearer(&token(3600));

    let response = h.server.get("/api/incidents/7").add_header(name, value).await;

    response.assert_status_ok();
    assert_eq!(received_count(&h.backend).await, 1);
}

#[tokio::test]
async fn test_authority_timeout_fails_open() {
    let h = harness(Options {
        authority_timeout: Duration::from_millis(100),
        ..Options::default()
    })
    .await;
    Mock::given(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&h.authority)
        .await;
    backend_answers(&h.backend, 200, "ok").await;
    let (name, value) = bearer(&token(3600));

    let response = h.server.get("/api/incidents/7").add_header(name, value).await;

    response.assert_status_ok();
    let requests = h.backend.received_requests().await.unwrap();
    assert_eq!(requests[0].headers.get("x-user-id").unwrap(), "u-42");
}

#[tokio::test]
async fn test_fail_closed_policy_rejects_on_outage() {
    let h = harness(Options {
        policy: FailurePolicy::Closed,
        ..Options::default()
    })
    .await;
    authority_answers(&h.authority, 503).await;
    backend_answers(&h.backend, 200, "ok").await;
    let (name, value) = bearer(&token(3600));

    let response = h.server.get("/api/incidents/7").add_header(name, value).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(message(&response), "Service unavailable");
    assert_eq!(received_count(&h.backend).await, 0);
}

#[tokio::test]
async fn test_basic_scheme_is_not_a_bearer_credential() {
    let h = harness(Options::default()).await;

    let response = h
        .server
        .get("/api/incidents/7")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic dTpw"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&response), "Not authenticated");
}
