#![allow(dead_code)]

use api_gateway::application::services::{
    FailurePolicy, IdentityRevalidator, RateLimiter, TokenVerifier,
};
use api_gateway::domain::{BodyMode, Claims, PathPattern, PathRewrite, RouteRule, RouteTable};
use api_gateway::infrastructure::authority::HttpIdentityAuthority;
use api_gateway::infrastructure::upstream::HttpForwarder;
use api_gateway::routes::app_router;
use api_gateway::state::GatewayState;
use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SECRET: &str = "integration-secret";

/// Knobs for a gateway under test.
pub struct Options {
    pub rate_limit: u32,
    pub policy: FailurePolicy,
    pub body_mode: BodyMode,
    pub max_body_bytes: usize,
    pub authority_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rate_limit: 100,
            policy: FailurePolicy::Open,
            body_mode: BodyMode::Passthrough,
            max_body_bytes: 1024 * 1024,
            authority_timeout: Duration::from_secs(2),
        }
    }
}

/// A gateway wired to a wiremock identity authority and a wiremock backend.
pub struct Harness {
    pub server: TestServer,
    pub authority: MockServer,
    pub backend: MockServer,
}

pub async fn harness(options: Options) -> Harness {
    let authority = MockServer::start().await;
    let backend = MockServer::start().await;

    let backend_url = Url::parse(&backend.uri()).unwrap();
    let rules = vec![
        RouteRule::new("auth", "/api/auth", backend_url.clone()),
        RouteRule::new("incidents", "/api/incidents", backend_url.clone())
            .with_rewrite(PathRewrite::new("^/api/incidents", "/api").unwrap()),
        RouteRule::new("offline", "/api/offline", Url::parse("http://127.0.0.1:1").unwrap()),
    ];
    let public_paths = ["/api/auth/login", "/api/auth/oauth/*"]
        .iter()
        .map(|p| PathPattern::parse(p))
        .collect();

    let http_authority = HttpIdentityAuthority::new(
        &Url::parse(&authority.uri()).unwrap(),
        "/api/auth/me",
        options.authority_timeout,
    )
    .unwrap();

    let state = GatewayState {
        routes: Arc::new(RouteTable::new(rules, public_paths).unwrap()),
        rate_limiter: Arc::new(RateLimiter::new(
            options.rate_limit,
            Duration::from_secs(900),
        )),
        verifier: Arc::new(TokenVerifier::new(SECRET)),
        revalidator: Arc::new(IdentityRevalidator::new(
            Arc::new(http_authority),
            options.policy,
        )),
        upstream: Arc::new(HttpForwarder::new(Duration::from_secs(2)).unwrap()),
        body_mode: options.body_mode,
        max_body_bytes: options.max_body_bytes,
        behind_proxy: false,
    };

    let server = TestServer::new(app_router(state)).unwrap();

    Harness {
        server,
        authority,
        backend,
    }
}

/// Signs a token for subject `u-42` expiring `exp_offset` seconds from now.
pub fn token(exp_offset: i64) -> String {
    let claims = Claims {
        sub: "u-42".to_string(),
        name: Some("Dana Reyes".to_string()),
        email: Some("dana@example.com".to_string()),
        role: Some("responder".to_string()),
        exp: Utc::now().timestamp() + exp_offset,
        iat: Some(Utc::now().timestamp()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

pub async fn authority_answers(authority: &MockServer, status: u16) {
    Mock::given(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(status))
        .mount(authority)
        .await;
}

pub async fn backend_answers(backend: &MockServer, status: u16, body: &str) {
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(backend)
        .await;
}

pub async fn received_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
