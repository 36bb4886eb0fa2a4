//! Handler for health check endpoint.

use axum::Json;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};

use super::gateway::request_client;
use crate::api::dto::health::HealthResponse;
use crate::application::pipeline;
use crate::state::GatewayState;

/// Liveness check answered by the gateway itself.
///
/// # Endpoint
///
/// `GET /health`
///
/// Always returns **200 OK**; backends and the identity authority are not
/// consulted. The request is not counted against the rate limit, but the
/// response still reports the caller's current quota.
///
/// # Response
///
/// ```json
/// { "status": "success", "version": "0.1.0" }
/// ```
pub async fn health_handler(State(state): State<GatewayState>, request: Request) -> Response {
    let client = request_client(&state, &request);

    let mut response = Json(HealthResponse {
        status: "success",
        version: env!("CARGO_PKG_VERSION"),
    })
    .into_response();

    pipeline::apply_quota_headers(&state, &client, response.headers_mut());
    response
}
