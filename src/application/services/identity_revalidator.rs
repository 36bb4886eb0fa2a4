//! Per-request session revalidation against the identity authority.

use axum::http::StatusCode;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::ports::IdentityAuthority;

/// What the authority said about a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revalidation {
    /// 2xx: the subject exists and is active.
    Active,
    /// 401/403: the session was revoked, deactivated or deleted.
    Revoked { status: StatusCode },
    /// No usable answer (timeout, transport error, any other status).
    Unavailable { reason: String },
}

/// What to do with a request when the authority gives no usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Let the request through; local signature verification already passed.
    #[default]
    Open,
    /// Reject the request as an upstream failure.
    Closed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(FailurePolicy::Open),
            "closed" => Ok(FailurePolicy::Closed),
            other => Err(format!("expected 'open' or 'closed', got '{other}'")),
        }
    }
}

/// Confirms that a locally valid credential still belongs to an active session.
pub struct IdentityRevalidator {
    authority: Arc<dyn IdentityAuthority>,
    policy: FailurePolicy,
}

impl IdentityRevalidator {
    pub fn new(authority: Arc<dyn IdentityAuthority>, policy: FailurePolicy) -> Self {
        Self { authority, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Presents `credential` to the authority and interprets the answer.
    ///
    /// Only an explicit 401/403 yields [`Revalidation::Revoked`]; every other
    /// failure is [`Revalidation::Unavailable`] and is logged here.
    pub async fn revalidate(&self, credential: &str) -> Revalidation {
        let outcome = match self.authority.check_session(credential).await {
            Ok(status) if status.is_success() => Revalidation::Active,
            Ok(status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)) => {
                Revalidation::Revoked { status }
            }
            Ok(status) => Revalidation::Unavailable {
                reason: format!("unexpected status {status}"),
            },
            Err(e) => Revalidation::Unavailable {
                reason: e.to_string(),
            },
        };

        if let Revalidation::Unavailable { reason } = &outcome {
            tracing::warn!(
                reason = %reason,
                policy = ?self.policy,
                "Identity authority check failed"
            );
        }

        outcome
    }
}
