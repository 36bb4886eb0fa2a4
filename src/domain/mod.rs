//! Core gateway model: routing rules, identity claims, the proxied envelope,
//! and the ports to external collaborators.
//!
//! Nothing here performs I/O; implementations of [`ports`] live in
//! `crate::infrastructure`.

pub mod claims;
pub mod envelope;
pub mod ports;
pub mod route_rule;
pub mod route_table;

pub use claims::Claims;
pub use envelope::{BodyMode, ForwardContext, ProxyEnvelope};
pub use route_rule::{PathPattern, PathRewrite, RouteRule};
pub use route_table::{Access, Route, RouteTable};
