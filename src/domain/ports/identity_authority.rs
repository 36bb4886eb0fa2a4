//! Port to the remote identity authority used for per-request revalidation.

use async_trait::async_trait;
use axum::http::StatusCode;
use thiserror::Error;

/// Transport-level failure talking to the identity authority.
///
/// These never mean "unauthorized"; only an explicit 401/403 status does.
#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("identity authority timed out")]
    Timeout,

    #[error("identity authority unreachable: {0}")]
    Unreachable(String),
}

/// Remote session check presenting the caller's own credential.
///
/// # Implementations
///
/// - [`crate::infrastructure::authority::HttpIdentityAuthority`] - HTTP client
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityAuthority: Send + Sync {
    /// Returns the status code the authority answered with.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] when no response was received in time.
    async fn check_session(&self, credential: &str) -> Result<StatusCode, AuthorityError>;
}
