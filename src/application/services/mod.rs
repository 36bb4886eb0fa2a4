//! Stateless and stateful building blocks the pipeline composes.

pub mod identity_revalidator;
pub mod rate_limiter;
pub mod token_verifier;

pub use identity_revalidator::{FailurePolicy, IdentityRevalidator, Revalidation};
pub use rate_limiter::{RateDecision, RateLimiter};
pub use token_verifier::{TokenVerifier, VerificationError};
