//! Header copying between the client and the storage service.
//!
//! Request and response headers are copied with every value in order.
//! The only names left out are the ones owned by the connection on each
//! side: hop-by-hop headers, and the inbound `Host` (the upstream
//! client derives it from the upstream URL).

use std::sync::LazyLock;

use axum::http::{header, HeaderMap, HeaderName};

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Headers for the upstream request, built from the inbound ones.
#[must_use]
pub fn forwarded_request_headers(original: &HeaderMap) -> HeaderMap {
    let mut headers = original.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers
}

/// Prepare upstream response headers for the client.
///
/// `content-length` is kept: the body is streamed through unchanged.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    strip_hop_by_hop(headers);
}
