//! Gateway configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//!
//! ## Required Variables
//!
//! - `JWT_SECRET` - HS256 secret shared with the identity authority
//! - `IDENTITY_AUTHORITY_URL` - Base URL of the identity service (e.g. `http://auth:4001`)
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:3000`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `BEHIND_PROXY` - Read client IP from `X-Forwarded-For` / `X-Real-IP` (default: `false`)
//! - `ROUTES_FILE` - JSON route table (default: `routes.json`)
//! - `PUBLIC_PATHS` - Comma-separated allow-list; `/x/*` matches a subtree
//! - `IDENTITY_CHECK_PATH` - Session check endpoint (default: `/api/auth/me`)
//! - `IDENTITY_TIMEOUT_SECS` - Session check deadline (default: 5)
//! - `REVALIDATION_FAILURE_POLICY` - `open` or `closed` (default: `open`)
//! - `UPSTREAM_TIMEOUT_SECS` - Default backend deadline (default: 10)
//! - `RATE_LIMIT_WINDOW_SECS` / `RATE_LIMIT_MAX` - Window length and budget (default: 900 / 100)
//! - `RATE_LIMIT_SWEEP_SECS` - Expired window eviction interval (default: 60)
//! - `MAX_BODY_BYTES` - Inbound body limit (default: 1 MiB)
//! - `BODY_MODE` - `passthrough` or `reencode` (default: `passthrough`)

pub mod routes;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::application::services::FailurePolicy;
use crate::domain::{BodyMode, PathPattern};

pub use routes::{load_route_table, parse_route_rules};

pub const DEFAULT_PUBLIC_PATHS: &str =
    "/health,/api/auth/login,/api/auth/register,/api/auth/oauth/*";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
    /// When true, the client key is read from X-Forwarded-For / X-Real-IP headers.
    /// Enable only when the gateway is behind a trusted reverse proxy.
    pub behind_proxy: bool,
    pub jwt_secret: String,
    pub routes_file: PathBuf,
    pub public_paths: Vec<String>,

    // ── Identity authority ──────────────────────────────────────────────────
    pub identity_authority_url: String,
    pub identity_check_path: String,
    pub identity_timeout_secs: u64,
    pub failure_policy: FailurePolicy,

    // ── Forwarding ──────────────────────────────────────────────────────────
    pub upstream_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub body_mode: BodyMode,

    // ── Rate limiting ───────────────────────────────────────────────────────
    pub rate_limit_window_secs: u64,
    pub rate_limit_max: u32,
    pub rate_limit_sweep_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or an enumerated value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        let behind_proxy = env::var("BEHIND_PROXY")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let routes_file = env::var("ROUTES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("routes.json"));

        let public_paths = public_paths_from_env();

        let identity_authority_url =
            env::var("IDENTITY_AUTHORITY_URL").context("IDENTITY_AUTHORITY_URL must be set")?;
        let identity_check_path =
            env::var("IDENTITY_CHECK_PATH").unwrap_or_else(|_| "/api/auth/me".to_string());

        let failure_policy = parse_enum::<FailurePolicy>("REVALIDATION_FAILURE_POLICY")?;
        let body_mode = parse_enum::<BodyMode>("BODY_MODE")?;

        Ok(Self {
            listen_addr,
            log_level,
            log_format,
            behind_proxy,
            jwt_secret,
            routes_file,
            public_paths,
            identity_authority_url,
            identity_check_path,
            identity_timeout_secs: parse_or("IDENTITY_TIMEOUT_SECS", 5),
            failure_policy,
            upstream_timeout_secs: parse_or("UPSTREAM_TIMEOUT_SECS", 10),
            max_body_bytes: parse_or("MAX_BODY_BYTES", 1024 * 1024),
            body_mode,
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 900),
            rate_limit_max: parse_or("RATE_LIMIT_MAX", 100),
            rate_limit_sweep_secs: parse_or("RATE_LIMIT_SWEEP_SECS", 60),
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is invalid
    /// - `jwt_secret` is empty
    /// - `identity_authority_url` is not an absolute http(s) URL
    /// - a timeout, window, budget or body limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if self.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let authority = self.identity_url()?;
        if authority.scheme() != "http" && authority.scheme() != "https" {
            anyhow::bail!(
                "IDENTITY_AUTHORITY_URL must start with 'http://' or 'https://', got '{}'",
                self.identity_authority_url
            );
        }

        if !self.identity_check_path.starts_with('/') {
            anyhow::bail!(
                "IDENTITY_CHECK_PATH must start with '/', got '{}'",
                self.identity_check_path
            );
        }

        if self.identity_timeout_secs == 0 {
            anyhow::bail!("IDENTITY_TIMEOUT_SECS must be greater than 0");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be greater than 0");
        }
        if self.rate_limit_window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be greater than 0");
        }
        if self.rate_limit_max == 0 {
            anyhow::bail!("RATE_LIMIT_MAX must be at least 1");
        }
        if self.rate_limit_sweep_secs == 0 {
            anyhow::bail!("RATE_LIMIT_SWEEP_SECS must be greater than 0");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be greater than 0");
        }

        Ok(())
    }

    /// Parsed identity authority base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `IDENTITY_AUTHORITY_URL` is not a valid URL.
    pub fn identity_url(&self) -> Result<Url> {
        Url::parse(&self.identity_authority_url).with_context(|| {
            format!(
                "IDENTITY_AUTHORITY_URL is not a valid URL: '{}'",
                self.identity_authority_url
            )
        })
    }

    pub fn public_patterns(&self) -> Vec<PathPattern> {
        parse_public_paths(&self.public_paths)
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(self.identity_timeout_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn rate_limit_sweep(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_secs)
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Routes file: {}", self.routes_file.display());
        tracing::info!("  Public paths: {}", self.public_paths.join(", "));
        tracing::info!(
            "  Identity authority: {}{} (timeout {}s, on failure: {:?})",
            self.identity_authority_url.trim_end_matches('/'),
            self.identity_check_path,
            self.identity_timeout_secs,
            self.failure_policy
        );
        tracing::info!("  JWT secret: {}", mask_secret(&self.jwt_secret));
        tracing::info!(
            "  Rate limit: {} requests / {}s",
            self.rate_limit_max,
            self.rate_limit_window_secs
        );
        tracing::info!("  Upstream timeout: {}s", self.upstream_timeout_secs);
        tracing::info!(
            "  Body: {:?}, max {} bytes",
            self.body_mode,
            self.max_body_bytes
        );
        tracing::info!("  Behind proxy: {}", self.behind_proxy);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
    }
}

/// Masks a secret for logging, keeping only its length.
fn mask_secret(secret: &str) -> String {
    format!("*** ({} bytes)", secret.len())
}

/// Reads `PUBLIC_PATHS`, falling back to [`DEFAULT_PUBLIC_PATHS`].
pub fn public_paths_from_env() -> Vec<String> {
    split_list(&env::var("PUBLIC_PATHS").unwrap_or_else(|_| DEFAULT_PUBLIC_PATHS.to_string()))
}

pub fn parse_public_paths<S: AsRef<str>>(paths: &[S]) -> Vec<PathPattern> {
    paths.iter().map(|p| PathPattern::parse(p.as_ref())).collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_enum<T>(key: &str) -> Result<T>
where
    T: FromStr<Err = String> + Default,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Invalid value for {key}")),
        Err(_) => Ok(T::default()),
    }
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if required variables are missing or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
