//! reqwest-backed [`Upstream`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use reqwest::{Client, redirect};
use std::time::Duration;
use tracing::debug;

use crate::domain::envelope::{ProxyEnvelope, strip_hop_by_hop};
use crate::domain::ports::Upstream;
use crate::error::GatewayError;

/// Issues the envelope against its target and streams the answer back.
///
/// Upstream status codes, including 4xx/5xx, are relayed as-is. Redirects are
/// not followed so the client sees them.
///
/// The deadline bounds the wait for response headers only; once the upstream
/// has answered, its body is streamed for as long as it takes.
pub struct HttpForwarder {
    client: Client,
    default_timeout: Duration,
}

impl HttpForwarder {
    /// Builds a forwarder that waits at most `default_timeout` for response
    /// headers unless the route sets its own deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(default_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(default_timeout)
            .redirect(redirect::Policy::none())
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            client,
            default_timeout,
        })
    }
}

#[async_trait]
impl Upstream for HttpForwarder {
    async fn forward(&self, envelope: ProxyEnvelope) -> Result<Response, GatewayError> {
        let ProxyEnvelope {
            service,
            method,
            url,
            headers,
            body,
            timeout,
        } = envelope;

        let mut request = self.client.request(method, url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }
        let deadline = timeout.unwrap_or(self.default_timeout);

        let upstream = match tokio::time::timeout(deadline, request.send()).await {
            Ok(Ok(upstream)) => upstream,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(GatewayError::UpstreamTimeout { service });
            }
            Ok(Err(e)) => {
                return Err(GatewayError::UpstreamUnavailable {
                    service,
                    reason: e.to_string(),
                });
            }
            Err(_) => return Err(GatewayError::UpstreamTimeout { service }),
        };

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);

        debug!(service = %service, status = %status, "Upstream answered");

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;

        Ok(response)
    }
}
