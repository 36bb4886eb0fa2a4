//! # API Gateway
//!
//! Single entry point in front of a set of backend services. Every request is
//! classified against a prefix route table, counted against a per-client rate
//! window, authenticated with an HS256 bearer token plus a live session check
//! when the route is protected, and then forwarded with identity headers
//! attached.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Route rules, claims, proxy envelope and ports
//! - **Application Layer** ([`application`]) - Rate limiter, token verifier,
//!   identity revalidator and the request pipeline
//! - **Infrastructure Layer** ([`infrastructure`]) - reqwest clients for the
//!   identity authority and backends
//! - **API Layer** ([`api`]) - Health endpoint, catch-all handler, tracing
//!
//! ## Quick Start
//!
//! ```bash
//! export JWT_SECRET="change-me"
//! export IDENTITY_AUTHORITY_URL="http://localhost:4001"
//! export ROUTES_FILE="routes.json"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::GatewayError;
pub use state::GatewayState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for the CLI and
/// integration tests.
pub mod prelude {
    pub use crate::application::services::{
        FailurePolicy, IdentityRevalidator, RateLimiter, TokenVerifier,
    };
    pub use crate::domain::{BodyMode, Claims, PathPattern, RouteRule, RouteTable};
    pub use crate::error::GatewayError;
    pub use crate::infrastructure::authority::HttpIdentityAuthority;
    pub use crate::infrastructure::upstream::HttpForwarder;
    pub use crate::routes::app_router;
    pub use crate::state::GatewayState;
}
