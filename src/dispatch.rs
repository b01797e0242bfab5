//! Entry point for every inbound request.
//!
//! [`dispatch`] classifies the request path with [`classify`] (checked in
//! this order: proxy prefix, map prefix, exact `/`, anything else),
//! rewrites the path, and hands the request to the proxy, the map
//! handler, the liveness answer, or a 404. Prefix tests are plain string
//! prefixes, not path-segment aware.
//!
//! The map handler always sees a `/`-rooted path (`/map` arrives as `/`,
//! `/mapfoo` as `/foo`). The remainder exactly as stripped is attached as
//! a [`MapRemainder`] extension.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::uri::PathAndQuery;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;

use crate::config::model::Config;
use crate::error::ProxyError;
use crate::proxy;
use crate::server::AppState;

/// What was left of the path after the map prefix, before rooting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRemainder(pub String);

/// Where a request goes, with the path it should see.
#[derive(Debug, PartialEq, Eq)]
pub enum Destination<'a> {
    Proxy(String),
    Map(&'a str),
    Liveness,
    NotFound,
}

#[must_use]
pub fn classify<'a>(config: &Config, path: &'a str) -> Destination<'a> {
    if let Some(rest) = path.strip_prefix(config.proxy.endpoint.as_str()) {
        return Destination::Proxy(rooted(rest));
    }
    if let Some(rest) = config
        .map_endpoint()
        .and_then(|endpoint| path.strip_prefix(endpoint))
    {
        return Destination::Map(rest);
    }
    if path == "/" {
        return Destination::Liveness;
    }
    Destination::NotFound
}

pub async fn dispatch(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let path = req.uri().path().to_string();

    match classify(&state.config, &path) {
        Destination::Proxy(rest) => match with_path(req, &rest) {
            Ok(req) => proxy::serve(&state, req).await,
            Err(e) => e.into_response(),
        },
        Destination::Map(rest) => match with_path(req, &rooted(rest)) {
            Ok(mut req) => {
                req.extensions_mut().insert(MapRemainder(rest.to_string()));
                let result: Result<Response, Infallible> = state.map.clone().oneshot(req).await;
                result.unwrap_or_else(|never| match never {})
            }
            Err(e) => e.into_response(),
        },
        Destination::Liveness => StatusCode::OK.into_response(),
        Destination::NotFound => ProxyError::NotFound.into_response(),
    }
}

fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Replace the request path, keeping the query and everything else.
fn with_path(mut req: Request, path: &str) -> Result<Request, ProxyError> {
    let path_and_query = match req.uri().query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let mut parts = req.uri().clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query)
            .map_err(|e| ProxyError::InvalidPath(e.into()))?,
    );
    *req.uri_mut() = Uri::from_parts(parts).map_err(|e| ProxyError::InvalidPath(e.into()))?;
    Ok(req)
}
