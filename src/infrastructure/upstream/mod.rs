//! Backend forwarding over HTTP.

mod http_forwarder;

pub use http_forwarder::HttpForwarder;
