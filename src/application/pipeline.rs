//! Per-request gateway pipeline.
//!
//! Each request moves through
//! `Received → Classified → RateChecked → (AuthChecked) → Forwarded → Completed`.
//! Every stage returns a `Result`; the first error ends the request in the
//! `Errored` state and is rendered by [`GatewayError`]'s `IntoResponse`.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, Request},
    http::{HeaderMap, HeaderName, HeaderValue, header, request::Parts},
    response::{IntoResponse, Response},
};
use axum_auth::AuthBearer;
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::application::services::{FailurePolicy, RateDecision, Revalidation};
use crate::domain::{Claims, ForwardContext, ProxyEnvelope, Route};
use crate::error::{AuthFailure, GatewayError};
use crate::state::GatewayState;
use crate::utils::client_addr::ClientAddr;

static RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Runs the full pipeline for one request and always produces a response.
pub async fn process(state: &GatewayState, client: &ClientAddr, request: Request) -> Response {
    let path = request.uri().path().to_owned();

    let Some(route) = state.routes.classify(&path) else {
        tracing::debug!(path = %path, "No route for path");
        let mut response = GatewayError::RouteNotFound.into_response();
        apply_quota_headers(state, client, response.headers_mut());
        return response;
    };

    let decision = state.rate_limiter.check(&client.key);

    let mut response = match dispatch(state, route, client, decision, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    apply_rate_headers(response.headers_mut(), &decision);
    response
}

async fn dispatch(
    state: &GatewayState,
    route: Route<'_>,
    client: &ClientAddr,
    decision: RateDecision,
    request: Request,
) -> Result<Response, GatewayError> {
    if !decision.allowed {
        tracing::info!(client = %client.key, route = %route.rule.name, "Rate limit exceeded");
        return Err(GatewayError::RateLimited);
    }

    let (mut parts, body) = request.into_parts();

    let claims = if route.is_public() {
        None
    } else {
        Some(authenticate(state, &mut parts).await?)
    };

    let body = read_body(body, state.max_body_bytes).await?;

    let envelope = ProxyEnvelope::build(
        route.rule,
        parts.method,
        &parts.uri,
        &parts.headers,
        body,
        ForwardContext {
            client_ip: client.ip,
            claims: claims.as_ref(),
            body_mode: state.body_mode,
        },
    )?;

    tracing::debug!(
        service = %envelope.service,
        method = %envelope.method,
        url = %envelope.url,
        "Forwarding request"
    );

    state.upstream.forward(envelope).await
}

/// Verifies the bearer credential locally, then with the identity authority.
async fn authenticate(state: &GatewayState, parts: &mut Parts) -> Result<Claims, GatewayError> {
    let AuthBearer(credential) = AuthBearer::from_request_parts(parts, &())
        .await
        .map_err(|_| AuthFailure::MissingCredential)?;

    if credential.trim().is_empty() {
        return Err(AuthFailure::MissingCredential.into());
    }

    let claims = state
        .verifier
        .verify(&credential)
        .map_err(|e| GatewayError::from(AuthFailure::from(e)))?;

    match state.revalidator.revalidate(&credential).await {
        Revalidation::Active => {}
        Revalidation::Revoked { status } => {
            tracing::info!(
                subject = %claims.sub,
                status = %status,
                "Identity authority rejected session"
            );
            return Err(AuthFailure::SessionRevoked.into());
        }
        Revalidation::Unavailable { reason } => match state.revalidator.policy() {
            FailurePolicy::Open => {
                tracing::warn!(subject = %claims.sub, "Admitting request without session check");
            }
            FailurePolicy::Closed => {
                return Err(GatewayError::UpstreamUnavailable {
                    service: "identity-authority".to_string(),
                    reason,
                });
            }
        },
    }

    Ok(claims)
}

/// Buffers the inbound body, rejecting anything larger than `limit` bytes.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(GatewayError::PayloadTooLarge { limit })
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            Err(GatewayError::BadRequest("Failed to read request body".to_string()))
        }
    }
}

/// Adds the client's current quota to a response that was not counted
/// against it (unrouted paths, health checks).
pub fn apply_quota_headers(state: &GatewayState, client: &ClientAddr, headers: &mut HeaderMap) {
    write_quota_headers(headers, &state.rate_limiter.peek(&client.key));
}

fn apply_rate_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    write_quota_headers(headers, decision);

    if !decision.allowed {
        headers.insert(header::RETRY_AFTER, HeaderValue::from(decision.reset_secs()));
    }
}

fn write_quota_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert(RATE_LIMIT_LIMIT.clone(), HeaderValue::from(decision.limit));
    headers.insert(
        RATE_LIMIT_REMAINING.clone(),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        RATE_LIMIT_RESET.clone(),
        HeaderValue::from(decision.reset_secs()),
    );
}
