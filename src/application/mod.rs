//! Application layer: the services that decide what happens to a request and
//! the pipeline that sequences them.
//!
//! # Available Services
//!
//! - [`services::rate_limiter::RateLimiter`] - Fixed-window request counting per client
//! - [`services::token_verifier::TokenVerifier`] - Local HS256 bearer token checks
//! - [`services::identity_revalidator::IdentityRevalidator`] - Session check against the identity authority
//!
//! [`pipeline::process`] runs them in order for every routed request.

pub mod pipeline;
pub mod services;
