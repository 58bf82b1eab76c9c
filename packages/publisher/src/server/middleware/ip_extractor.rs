use axum::{
    extract::{ConnectInfo, Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

use crate::server::app::AppState;

/// Client address used as the admin rate-limit key
#[derive(Clone, Debug)]
pub struct ClientIp(pub IpAddr);

/// Resolve the caller's address.
///
/// Forwarded headers are client-controlled unless a proxy rewrites them, so
/// they are read only when `trust_proxy` is set: first `X-Forwarded-For`
/// hop, then `X-Real-IP`. The socket address is the fallback, and the only
/// source otherwise.
fn resolve_ip(headers: &HeaderMap, socket: Option<IpAddr>, trust_proxy: bool) -> Option<IpAddr> {
    if !trust_proxy {
        return socket;
    }

    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or(socket)
}

/// Store [`ClientIp`] in the request extensions when an address is known.
///
/// `ConnectInfo` is only present when the server is started with
/// `into_make_service_with_connect_info`; tests drive the router without it.
pub async fn extract_client_ip(
    Extension(state): Extension<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket = connect_info.map(|ConnectInfo(addr)| addr.ip());

    if let Some(ip) = resolve_ip(request.headers(), socket, state.trust_proxy_headers) {
        request.extensions_mut().insert(ClientIp(ip));
    }

    next.run(request).await
}
