use std::sync::Arc;

use crate::application::services::{IdentityRevalidator, RateLimiter, TokenVerifier};
use crate::domain::ports::Upstream;
use crate::domain::{BodyMode, RouteTable};

/// Shared per-process context handed to every request.
///
/// Only the rate limiter holds mutable state; everything else is read-only
/// after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub routes: Arc<RouteTable>,
    pub rate_limiter: Arc<RateLimiter>,
    pub verifier: Arc<TokenVerifier>,
    pub revalidator: Arc<IdentityRevalidator>,
    pub upstream: Arc<dyn Upstream>,
    pub body_mode: BodyMode,
    /// Inbound body ceiling in bytes; larger bodies end with 413.
    pub max_body_bytes: usize,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for the client address.
    pub behind_proxy: bool,
}
