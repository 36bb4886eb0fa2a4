//! HTTP surface of the gateway.
//!
//! # Modules
//!
//! - [`dto`] - Response bodies owned by the gateway itself
//! - [`handlers`] - Health endpoint and the catch-all gateway handler
//! - [`middleware`] - Request tracing

pub mod dto;
pub mod handlers;
pub mod middleware;
