//! Read-only forwarding to the storage service.
//!
//! [`serve`] is what the dispatcher calls for proxy-prefixed requests:
//! it runs [`forward`] inside an [`AccessLog`]. [`forward`] performs one
//! request/response cycle: method check, root shortcut, deadline, URL
//! construction, header copy, a single upstream call, and a streamed
//! response. No retries. Submodules handle URL construction
//! ([`upstream`]), header copying ([`headers`]), the pooled client
//! ([`client`]), and the deadline-bounded body ([`body`]).

pub mod body;
pub mod client;
pub mod headers;
pub mod upstream;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::Empty;

use crate::access_log::AccessLog;
use crate::error::ProxyError;
use crate::server::AppState;

use self::body::DeadlineBody;

/// Forward `req` and log the result.
pub async fn serve(state: &AppState, req: Request) -> Response {
    let log = AccessLog::start(&state.config, &req);
    let outcome = forward(state, req).await;
    log.finish(outcome)
}

pub async fn forward(state: &AppState, req: Request) -> Result<Response, ProxyError> {
    // Request bodies are never forwarded; dropping it here releases it.
    let (parts, _) = req.into_parts();

    if parts.method != Method::GET && parts.method != Method::HEAD {
        return Err(ProxyError::MethodNotAllowed);
    }
    if parts.uri.path() == "/" {
        return Ok(StatusCode::OK.into_response());
    }

    let timeout = state.config.request_timeout();
    let deadline = tokio::time::Instant::now() + timeout;

    let url = upstream::upstream_url(&state.config, &parts.uri);
    let mut upstream_req = hyper::Request::builder()
        .method(parts.method.clone())
        .uri(url.as_str())
        .body(Empty::new())
        .map_err(ProxyError::RequestConstruction)?;
    *upstream_req.headers_mut() = headers::forwarded_request_headers(&parts.headers);

    tracing::trace!(method = %parts.method, url = %url, "issuing upstream request");

    let upstream_resp = tokio::time::timeout_at(deadline, state.client.request(upstream_req))
        .await
        .map_err(|_| ProxyError::Timeout(timeout))?
        .map_err(ProxyError::UpstreamCall)?;

    let (mut resp_parts, incoming) = upstream_resp.into_parts();
    headers::strip_response_hop_by_hop(&mut resp_parts.headers);

    Ok(Response::from_parts(
        resp_parts,
        Body::new(DeadlineBody::new(incoming, deadline, timeout)),
    ))
}
