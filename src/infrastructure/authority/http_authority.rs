//! reqwest-backed [`IdentityAuthority`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::{Client, redirect};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::domain::ports::{AuthorityError, IdentityAuthority};

/// Calls `GET {base}{check_path}` with the caller's bearer credential.
///
/// The request carries its own deadline; a slow authority surfaces as
/// [`AuthorityError::Timeout`] and never blocks the pipeline past it.
pub struct HttpIdentityAuthority {
    client: Client,
    check_url: Url,
}

impl HttpIdentityAuthority {
    /// # Errors
    ///
    /// Returns an error if `base_url` cannot carry a path or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &Url, check_path: &str, timeout: Duration) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Identity authority URL '{base_url}' cannot be a base URL");
        }

        let mut check_url = base_url.clone();
        let base_path = check_url.path().trim_end_matches('/').to_string();
        let check_path = check_path.trim_start_matches('/');
        check_url.set_path(&format!("{base_path}/{check_path}"));

        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .context("Failed to build identity authority HTTP client")?;

        Ok(Self { client, check_url })
    }

    pub fn check_url(&self) -> &Url {
        &self.check_url
    }
}

#[async_trait]
impl IdentityAuthority for HttpIdentityAuthority {
    async fn check_session(&self, credential: &str) -> Result<StatusCode, AuthorityError> {
        let response = self
            .client
            .get(self.check_url.clone())
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthorityError::Timeout
                } else {
                    AuthorityError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        debug!(status = %status, "Identity authority answered");

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn authority(server: &MockServer, timeout: Duration) -> HttpIdentityAuthority {
        let base = Url::parse(&server.uri()).unwrap();
        HttpIdentityAuthority::new(&base, "/api/auth/me", timeout).unwrap()
    }

    #[tokio::test]
    async fn test_presents_bearer_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(header("authorization", "Bearer abc.def.ghi"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let status = authority(&server, Duration::from_secs(2))
            .await
            .check_session("abc.def.ghi")
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_relays_rejection_status() {
        let server = MockServer::start().await;
        Mock::given(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let status = authority(&server, Duration::from_secs(2))
            .await
            .check_session("t")
            .await
            .unwrap();

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_slow_authority_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let result = authority(&server, Duration::from_millis(50))
            .await
            .check_session("t")
            .await;

        assert!(matches!(result, Err(AuthorityError::Timeout)));
    }

    #[tokio::test]
    async fn test_unreachable_authority() {
        let base = Url::parse("http://127.0.0.1:1").unwrap();
        let authority =
            HttpIdentityAuthority::new(&base, "/api/auth/me", Duration::from_secs(2)).unwrap();

        let result = authority.check_session("t").await;

        assert!(matches!(result, Err(AuthorityError::Unreachable(_))));
    }

    #[test]
    fn test_check_url_joins_path() {
        let base = Url::parse("http://identity:4001").unwrap();
        let authority =
            HttpIdentityAuthority::new(&base, "/api/auth/me", Duration::from_secs(1)).unwrap();

        assert_eq!(authority.check_url().as_str(), "http://identity:4001/api/auth/me");
    }

    #[test]
    fn test_check_url_keeps_base_path() {
        let base = Url::parse("http://identity:4001/auth-service/").unwrap();
        let authority =
            HttpIdentityAuthority::new(&base, "/api/auth/me", Duration::from_secs(1)).unwrap();

        assert_eq!(
            authority.check_url().as_str(),
            "http://identity:4001/auth-service/api/auth/me"
        );
    }
}
