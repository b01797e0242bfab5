//! Per-request access logging for the proxy path.
//!
//! [`AccessLog::start`] snapshots what is known when a request arrives
//! (method, rewritten path, allowlisted headers, start time).
//! [`AccessLog::finish`] takes the forwarder's outcome and returns the
//! response unchanged. An error is logged right away. A successful
//! response is logged once its body has been fully streamed, has failed
//! mid-stream, or has been dropped by a departing client, so the elapsed
//! time covers the whole transfer.
//!
//! Errors are always logged. Everything else is logged at `DEBUG` only
//! when the configured level is `debug` or `trace`.

pub mod capture;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http_body::{Body as _, Frame, SizeHint};

use crate::config::model::Config;
use crate::error::ProxyError;
use capture::CapturedStatus;

#[derive(Debug)]
pub struct AccessLog {
    method: Method,
    path: String,
    endpoint: String,
    headers: BTreeMap<String, String>,
    verbose: bool,
    started: Instant,
    status: CapturedStatus,
}

enum Outcome<'a> {
    Completed,
    Abandoned,
    Failed(&'a dyn Display),
}

impl AccessLog {
    #[must_use]
    pub fn start(config: &Config, req: &Request) -> Self {
        let headers = config
            .proxy
            .log_headers
            .iter()
            .filter_map(|name| {
                req.headers()
                    .get(name.as_str())
                    .filter(|value| !value.is_empty())
                    .map(|value| {
                        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                        (name.clone(), value)
                    })
            })
            .collect();

        Self {
            method: req.method().clone(),
            path: req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string()),
            endpoint: config.proxy.endpoint.clone(),
            headers,
            verbose: config.log_level.is_verbose(),
            started: Instant::now(),
            status: CapturedStatus::default(),
        }
    }

    /// Allowlisted request headers that were present and non-empty.
    #[must_use]
    pub const fn request_headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn status(&self) -> CapturedStatus {
        self.status
    }

    pub fn finish(mut self, outcome: Result<Response, ProxyError>) -> Response {
        match outcome {
            Ok(response) => {
                self.status.set(response.status());
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(LoggedBody::new(body, self)))
            }
            Err(err) => {
                self.status.set(err.status());
                self.emit(&Outcome::Failed(&err));
                err.into_response()
            }
        }
    }

    fn emit(&self, outcome: &Outcome<'_>) {
        let elapsed = self.started.elapsed();
        let response = self.status.resolve().as_u16();
        // BTreeMap<String, String> always serializes
        let req_headers = serde_json::to_string(&self.headers).unwrap_or_default();

        match outcome {
            Outcome::Failed(error) => tracing::error!(
                method = %self.method,
                elapsed = ?elapsed,
                path = %self.path,
                proxy_endpoint = %self.endpoint,
                response,
                req_headers = %req_headers,
                error = %error,
                "failed to handle request"
            ),
            Outcome::Completed | Outcome::Abandoned if self.verbose => tracing::debug!(
                method = %self.method,
                elapsed = ?elapsed,
                path = %self.path,
                proxy_endpoint = %self.endpoint,
                response,
                req_headers = %req_headers,
                completed = matches!(outcome, Outcome::Completed),
                "finished handling request"
            ),
            Outcome::Completed | Outcome::Abandoned => {}
        }
    }
}

/// Response body that reports to the access log when it ends.
pub struct LoggedBody {
    inner: Body,
    log: Option<AccessLog>,
}

impl LoggedBody {
    fn new(inner: Body, log: AccessLog) -> Self {
        Self {
            inner,
            log: Some(log),
        }
    }

    fn complete(&mut self, outcome: &Outcome<'_>) {
        if let Some(log) = self.log.take() {
            log.emit(outcome);
        }
    }
}

impl http_body::Body for LoggedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_frame(cx);
        match &poll {
            Poll::Ready(None) => this.complete(&Outcome::Completed),
            Poll::Ready(Some(Err(e))) => {
                let message = format!("response body truncated: {e}");
                this.complete(&Outcome::Failed(&message));
            }
            Poll::Ready(Some(Ok(_))) | Poll::Pending => {}
        }
        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for LoggedBody {
    fn drop(&mut self) {
        let outcome = if self.inner.is_end_stream() {
            Outcome::Completed
        } else {
            Outcome::Abandoned
        };
        self.complete(&outcome);
    }
}
