use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Uniform error envelope returned to clients: `{"status":"error","message":...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

/// Reason a protected request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization: Bearer` header.
    MissingCredential,
    Malformed,
    Expired,
    InvalidSignature,
    /// The identity authority explicitly rejected the session.
    SessionRevoked,
}

impl AuthFailure {
    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::MissingCredential => "Not authenticated",
            AuthFailure::Malformed => "Invalid token format",
            AuthFailure::Expired => "Token expired",
            AuthFailure::InvalidSignature => "Invalid token",
            AuthFailure::SessionRevoked => "Session is no longer valid",
        }
    }
}

/// Every way a request can end in the `Errored` state.
///
/// Display strings are for logs; the client only ever sees [`GatewayError::public_message`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no route matches the request path")]
    RouteNotFound,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("authentication failed: {0:?}")]
    Unauthenticated(AuthFailure),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("upstream {service} unavailable: {reason}")]
    UpstreamUnavailable { service: String, reason: String },

    #[error("upstream {service} timed out")]
    UpstreamTimeout { service: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound => StatusCode::NOT_FOUND,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            GatewayError::RouteNotFound => "Route not found".to_string(),
            GatewayError::RateLimited => "Too many requests, try again later".to_string(),
            GatewayError::Unauthenticated(failure) => failure.message().to_string(),
            GatewayError::BadRequest(message) => message.clone(),
            GatewayError::PayloadTooLarge { .. } => "Payload too large".to_string(),
            GatewayError::UpstreamUnavailable { .. } => "Service unavailable".to_string(),
            GatewayError::UpstreamTimeout { .. } => "Service timed out".to_string(),
            GatewayError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<AuthFailure> for GatewayError {
    fn from(failure: AuthFailure) -> Self {
        GatewayError::Unauthenticated(failure)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Internal(cause) => {
                tracing::error!(error = ?cause, "Request failed with internal error");
            }
            GatewayError::UpstreamUnavailable { service, reason } => {
                tracing::warn!(service = %service, reason = %reason, "Upstream unavailable");
            }
            GatewayError::UpstreamTimeout { service } => {
                tracing::warn!(service = %service, "Upstream timed out");
            }
            other => {
                tracing::debug!(error = %other, "Request rejected");
            }
        }

        let status = self.status_code();
        (status, Json(ErrorBody::new(self.public_message()))).into_response()
    }
}
