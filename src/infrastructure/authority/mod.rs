//! Identity authority client.

mod http_authority;

pub use http_authority::HttpIdentityAuthority;
