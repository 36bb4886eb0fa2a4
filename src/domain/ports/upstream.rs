//! Port to the backend services requests are forwarded to.

use async_trait::async_trait;
use axum::response::Response;

use crate::domain::envelope::ProxyEnvelope;
use crate::error::GatewayError;

/// Sends a prepared envelope to its target service and relays the answer.
///
/// # Implementations
///
/// - [`crate::infrastructure::upstream::HttpForwarder`] - reqwest-backed forwarder
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Upstream: Send + Sync {
    /// # Errors
    ///
    /// Returns [`GatewayError::UpstreamUnavailable`] if the service cannot be reached
    /// and [`GatewayError::UpstreamTimeout`] if it does not answer before the deadline.
    async fn forward(&self, envelope: ProxyEnvelope) -> Result<Response, GatewayError>;
}
