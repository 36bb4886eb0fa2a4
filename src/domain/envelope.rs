//! The in-flight request handed to the forwarder.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, header};
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use super::claims::Claims;
use super::route_rule::RouteRule;
use crate::error::GatewayError;

/// Headers meaningful only for a single connection leg (RFC 9110 §7.6.1).
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const IDENTITY_HEADER_PREFIX: &str = "x-user-";

/// How the inbound body is turned into the outbound one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// Forward the received bytes unchanged.
    #[default]
    Passthrough,
    /// Parse JSON bodies and forward the re-serialized document.
    Reencode,
}

impl FromStr for BodyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passthrough" => Ok(BodyMode::Passthrough),
            "reencode" => Ok(BodyMode::Reencode),
            other => Err(format!(
                "expected 'passthrough' or 'reencode', got '{other}'"
            )),
        }
    }
}

/// Everything the forwarder needs to issue the upstream call.
#[derive(Debug, Clone)]
pub struct ProxyEnvelope {
    /// Name of the target route, used in logs and errors.
    pub service: String,
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub timeout: Option<Duration>,
}

/// Per-request inputs for [`ProxyEnvelope::build`].
#[derive(Debug, Clone, Copy)]
pub struct ForwardContext<'a> {
    pub client_ip: Option<IpAddr>,
    pub claims: Option<&'a Claims>,
    pub body_mode: BodyMode,
}

impl ProxyEnvelope {
    /// Builds the outbound request for `rule` from the inbound request parts.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BadRequest`] if the body must be re-encoded and is
    /// not valid JSON, and [`GatewayError::Internal`] if the upstream URL cannot be
    /// assembled.
    pub fn build(
        rule: &RouteRule,
        method: Method,
        uri: &Uri,
        inbound_headers: &HeaderMap,
        body: Bytes,
        ctx: ForwardContext<'_>,
    ) -> Result<Self, GatewayError> {
        let url = upstream_url(rule, uri)?;
        let headers = forwarded_headers(inbound_headers, ctx.client_ip, ctx.claims)?;
        let body = encode_body(ctx.body_mode, inbound_headers, body)?;

        Ok(Self {
            service: rule.name.clone(),
            method,
            url,
            headers,
            body,
            timeout: rule.timeout,
        })
    }
}

/// Joins the target base URL with the rewritten path and the original query.
pub fn upstream_url(rule: &RouteRule, uri: &Uri) -> Result<Url, GatewayError> {
    let path = rule.upstream_path(uri.path());

    let mut url = rule.target.clone();
    if url.cannot_be_a_base() {
        return Err(GatewayError::Internal(anyhow::anyhow!(
            "route '{}' target '{}' cannot be a base URL",
            rule.name,
            rule.target
        )));
    }

    let base_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{base_path}{path}"));
    url.set_query(uri.query());

    Ok(url)
}

/// Removes hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_str(token.trim()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn forwarded_headers(
    inbound: &HeaderMap,
    client_ip: Option<IpAddr>,
    claims: Option<&Claims>,
) -> Result<HeaderMap, GatewayError> {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);

    let original_host = headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    // Identity headers are only ever set by the gateway itself.
    let spoofed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(IDENTITY_HEADER_PREFIX))
        .cloned()
        .collect();
    for name in spoofed {
        headers.remove(name);
    }

    if let Some(claims) = claims {
        for (name, value) in claims.identity_headers() {
            // Claim values that are not valid header text are skipped, not fatal.
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.insert(HeaderName::from_static(name), value);
            }
        }
    }

    if let Some(ip) = client_ip {
        let forwarded_for = match headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            Some(existing) if !existing.trim().is_empty() => format!("{existing}, {ip}"),
            _ => ip.to_string(),
        };
        let value = HeaderValue::from_str(&forwarded_for)
            .map_err(|e| GatewayError::Internal(anyhow::anyhow!("x-forwarded-for: {e}")))?;
        headers.insert("x-forwarded-for", value);
    }

    if let Some(host) = original_host {
        headers.insert("x-forwarded-host", host);
    }

    if !headers.contains_key("x-forwarded-proto") {
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
    }

    Ok(headers)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

fn encode_body(mode: BodyMode, headers: &HeaderMap, body: Bytes) -> Result<Bytes, GatewayError> {
    if body.is_empty() || mode == BodyMode::Passthrough || !is_json(headers) {
        return Ok(body);
    }

    let document: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| GatewayError::BadRequest("Invalid JSON body".to_string()))?;

    serde_json::to_vec(&document)
        .map(Bytes::from)
        .map_err(|e| GatewayError::Internal(e.into()))
}
