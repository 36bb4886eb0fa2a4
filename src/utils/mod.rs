//! Request helpers shared by handlers and the CLI.
//!
//! - [`client_addr`] - Client key derivation for rate limiting and forwarding headers

pub mod client_addr;
