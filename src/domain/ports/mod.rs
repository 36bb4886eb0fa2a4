//! Interfaces to the gateway's external collaborators.
//!
//! Implementations live in `crate::infrastructure`; mocks are generated via
//! `mockall` for unit tests.

pub mod identity_authority;
pub mod upstream;

pub use identity_authority::{AuthorityError, IdentityAuthority};
pub use upstream::Upstream;

#[cfg(test)]
pub use identity_authority::MockIdentityAuthority;
#[cfg(test)]
pub use upstream::MockUpstream;
