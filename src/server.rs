//! HTTP server initialization and runtime setup.
//!
//! Builds the gateway state from [`Config`], starts background maintenance and
//! runs the Axum server until a shutdown signal arrives.

use crate::application::services::{IdentityRevalidator, RateLimiter, TokenVerifier};
use crate::config::{Config, load_route_table};
use crate::infrastructure::authority::HttpIdentityAuthority;
use crate::infrastructure::upstream::HttpForwarder;
use crate::routes::app_router;
use crate::state::GatewayState;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Assembles the shared state described by `config`.
///
/// # Errors
///
/// Returns an error if the route table cannot be loaded or an HTTP client
/// cannot be built.
pub fn build_state(config: &Config) -> Result<GatewayState> {
    let routes = load_route_table(&config.routes_file, config.public_patterns())?;
    tracing::info!(routes = routes.rules().len(), "Route table loaded");

    let authority = HttpIdentityAuthority::new(
        &config.identity_url()?,
        &config.identity_check_path,
        config.identity_timeout(),
    )?;

    let forwarder = HttpForwarder::new(config.upstream_timeout())?;

    Ok(GatewayState {
        routes: Arc::new(routes),
        rate_limiter: Arc::new(RateLimiter::new(
            config.rate_limit_max,
            config.rate_limit_window(),
        )),
        verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
        revalidator: Arc::new(IdentityRevalidator::new(
            Arc::new(authority),
            config.failure_policy,
        )),
        upstream: Arc::new(forwarder),
        body_mode: config.body_mode,
        max_body_bytes: config.max_body_bytes,
        behind_proxy: config.behind_proxy,
    })
}

/// Runs the gateway with the given configuration.
///
/// Initializes:
/// - Route table, identity authority client and upstream forwarder
/// - Rate-window sweeper
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - State assembly fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config)?;

    let sweeper = state
        .rate_limiter
        .clone()
        .spawn_sweeper(config.rate_limit_sweep());
    tracing::info!("Rate limit sweeper started");

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    tracing::info!("Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
