//! The shared, connection-pooled upstream client.
//!
//! One [`UpstreamClient`] is built at startup and cloned into every
//! request (clones share the pool). It carries the storage credentials so
//! that clients of the proxy never need them.

use bytes::Bytes;
use http_body_util::Empty;
use hyper_util::client::legacy::{Client, ResponseFuture};
use hyper_util::rt::TokioExecutor;

use axum::http::{header, HeaderValue};

use crate::config::model::ClientConfig;
use crate::error::GcsHelperError;

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Empty<Bytes>>;

/// Upstream requests never carry a body.
pub type UpstreamRequest = hyper::Request<Empty<Bytes>>;

#[derive(Clone)]
pub struct UpstreamClient {
    http: HttpClient,
    authorization: Option<HeaderValue>,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("authorization", &self.authorization.is_some())
            .finish_non_exhaustive()
    }
}

impl UpstreamClient {
    pub fn new(config: &ClientConfig) -> Result<Self, GcsHelperError> {
        let authorization = config
            .access_token
            .as_deref()
            .map(|token| {
                HeaderValue::from_str(&format!("Bearer {token}")).map(|mut value| {
                    value.set_sensitive(true);
                    value
                })
            })
            .transpose()
            .map_err(GcsHelperError::InvalidAccessToken)?;

        Ok(Self {
            http: build_http_client(config),
            authorization,
        })
    }

    /// Issue `req`, replacing any inbound `Authorization` with the
    /// configured credentials.
    pub fn request(&self, mut req: UpstreamRequest) -> ResponseFuture {
        if let Some(value) = &self.authorization {
            req.headers_mut().insert(header::AUTHORIZATION, value.clone());
        }
        self.http.request(req)
    }
}

#[must_use]
pub fn build_http_client(config: &ClientConfig) -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls cannot
    // auto-detect which one to use. Explicitly install `ring` as the default.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(config.idle_timeout())
        .pool_max_idle_per_host(config.max_idle_conns)
        .build(https)
}
