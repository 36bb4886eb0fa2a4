//! Infrastructure layer for external integrations.
//!
//! Concrete HTTP implementations of the ports defined in [`crate::domain::ports`].
//!
//! # Modules
//!
//! - [`authority`] - Session checks against the identity authority
//! - [`upstream`] - Request forwarding to backend services

pub mod authority;
pub mod upstream;
