//! Upstream URL construction.
//!
//! The bucket either qualifies the storage host (`<bucket>.<host>`) or,
//! with `proxy.bucket_on_path`, is expected as the first segment of the
//! request path and the bare host is used.

use std::borrow::Cow;

use axum::http::Uri;

use crate::config::model::Config;

#[must_use]
pub fn upstream_host(config: &Config) -> Cow<'_, str> {
    if config.proxy.bucket_on_path {
        Cow::Borrowed(config.upstream.host.as_str())
    } else {
        Cow::Owned(format!("{}.{}", config.bucket_name, config.upstream.host))
    }
}

/// `scheme://host` followed by the request's path and query, untouched.
#[must_use]
pub fn upstream_url(config: &Config, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    format!(
        "{}://{}{}",
        config.upstream.scheme,
        upstream_host(config),
        path_and_query
    )
}
