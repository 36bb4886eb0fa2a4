//! Catch-all handler feeding every non-health request into the pipeline.

use axum::extract::{ConnectInfo, Request, State};
use axum::response::Response;
use std::net::SocketAddr;

use crate::application::pipeline;
use crate::state::GatewayState;
use crate::utils::client_addr::{ClientAddr, client_addr};

/// Resolves the client key and hands the request to [`pipeline::process`].
pub async fn gateway_handler(State(state): State<GatewayState>, request: Request) -> Response {
    let client = request_client(&state, &request);

    pipeline::process(&state, &client, request).await
}

/// Client address of `request`.
///
/// The peer address comes from `ConnectInfo` when the router is served with
/// `into_make_service_with_connect_info`; without it the client falls back to
/// the shared `unknown` key unless forwarding headers are trusted.
pub(crate) fn request_client(state: &GatewayState, request: &Request) -> ClientAddr {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    client_addr(request.headers(), peer, state.behind_proxy)
}
