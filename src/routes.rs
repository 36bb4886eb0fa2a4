//! Top-level router.
//!
//! # Route Structure
//!
//! - `GET /health` - Liveness check answered locally (never counted against the rate limit)
//! - everything else - Gateway pipeline: classify, rate limit, authenticate, forward
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging

use crate::api::handlers::{gateway_handler, health_handler};
use crate::api::middleware::tracing;
use crate::state::GatewayState;
use axum::Router;
use axum::routing::get;

/// Constructs the gateway router.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// pipeline can key rate limits by peer address.
pub fn app_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(gateway_handler)
        .with_state(state)
        .layer(tracing::layer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{
        FailurePolicy, IdentityRevalidator, RateLimiter, TokenVerifier,
    };
    use crate::domain::ports::{MockIdentityAuthority, MockUpstream};
    use crate::domain::{BodyMode, PathPattern, RouteRule, RouteTable};
    use axum::body::{Body, to_bytes};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use url::Url;

    fn router(upstream: MockUpstream) -> Router {
        let routes = RouteTable::new(
            vec![
                RouteRule::new("status", "/status", Url::parse("http://status:4003").unwrap())
                    .public(),
            ],
            vec![PathPattern::parse("/health")],
        )
        .unwrap();

        app_router(GatewayState {
            routes: Arc::new(routes),
            rate_limiter: Arc::new(RateLimiter::new(10, Duration::from_secs(60))),
            verifier: Arc::new(TokenVerifier::new("routes-secret")),
            revalidator: Arc::new(IdentityRevalidator::new(
                Arc::new(MockIdentityAuthority::new()),
                FailurePolicy::Open,
            )),
            upstream: Arc::new(upstream),
            body_mode: BodyMode::Passthrough,
            max_body_bytes: 1024,
            behind_proxy: false,
        })
    }

    #[tokio::test]
    async fn test_health_bypasses_pipeline() {
        let response = router(MockUpstream::new())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "success");
    }

    #[tokio::test]
    async fn test_health_reports_quota_without_counting() {
        let app = router(MockUpstream::new());

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(Request::get("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.headers()["ratelimit-limit"], "10");
            assert_eq!(response.headers()["ratelimit-remaining"], "10");
        }
    }

    #[tokio::test]
    async fn test_peer_address_reaches_forwarded_headers() {
        let mut upstream = MockUpstream::new();
        upstream
            .expect_forward()
            .withf(|envelope| {
                envelope.url.as_str() == "http://status:4003/status/ping"
                    && envelope.headers.get("x-forwarded-for").unwrap() == "203.0.113.9"
            })
            .times(1)
            .returning(|_| Ok(Response::new(Body::from("pong"))));

        let peer: SocketAddr = "203.0.113.9:51000".parse().unwrap();
        let mut request = Request::get("/status/ping").body(Body::empty()).unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = router(upstream).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-remaining"], "9");
    }
}
