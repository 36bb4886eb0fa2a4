//! Client address extraction for rate limiting and `X-Forwarded-For`.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Key used when neither headers nor the socket reveal the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolved identity of the connecting client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr {
    pub ip: Option<IpAddr>,
    /// Rate-limit key; the IP in text form, or [`UNKNOWN_CLIENT`].
    pub key: String,
}

impl ClientAddr {
    pub fn from_ip(ip: Option<IpAddr>) -> Self {
        let key = ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        Self { ip, key }
    }
}

/// Determines the client address for a request.
///
/// When `behind_proxy` is set, the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`, then the socket peer. Otherwise only the socket peer is used;
/// forwarding headers from untrusted clients are trivially spoofable.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.5, 10.0.0.1".parse().unwrap());
///
/// let client = client_addr(&headers, None, true);
/// assert_eq!(client.key, "203.0.113.5");
/// ```
pub fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> ClientAddr {
    if behind_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
        };

        if let Some(ip) = forwarded.or_else(real_ip) {
            return ClientAddr::from_ip(Some(ip));
        }
    }

    ClientAddr::from_ip(peer.map(|addr| addr.ip()))
}
