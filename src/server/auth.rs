use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;

use super::error::ApiError;
use super::routes::AppContext;

/// Secret token header; paired with the claimed GUID on every
/// authenticated operation.
pub const TOKEN_HEADER: &str = "x-api-token";
pub const GUID_HEADER: &str = "x-server-guid";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Runs the auth gate ahead of round and progression routes, attaching the
/// trusted [`crate::progression::auth::AuthedServer`] identity to the
/// request on success.
pub async fn require_server_auth(
    Extension(ctx): Extension<Arc<AppContext>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = header_value(&request, TOKEN_HEADER);
    let guid = header_value(&request, GUID_HEADER);
    let peer_ip = client_ip(&request, ctx.trust_proxy);

    let identity = ctx
        .auth
        .authenticate(token.as_deref(), guid.as_deref(), &peer_ip)
        .await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Observed caller address: the first `X-Forwarded-For` hop when running
/// behind a trusted proxy, the socket peer address otherwise.
fn client_ip(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = request
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
        {
            if let Some(first) = forwarded
                .split(',')
                .map(str::trim)
                .find(|hop| !hop.is_empty())
            {
                return first.to_owned();
            }
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}
