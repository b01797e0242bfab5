//! `gcs-helper health` — probe a running instance.
//!
//! Sends `GET /` to the given base URL, which every instance answers with
//! an empty `200 OK`. Anything else, or no answer within ten seconds, is
//! a failure.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Empty;
use hyper::StatusCode;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::HealthArgs;
use crate::error::GcsHelperError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn execute(args: HealthArgs) -> Result<(), GcsHelperError> {
    let url = probe_url(&args.url);
    let uri: hyper::Uri =
        url.parse()
            .map_err(|e: hyper::http::uri::InvalidUri| GcsHelperError::UriParse {
                source: Box::new(e),
            })?;

    let connector = hyper_util::client::legacy::connect::HttpConnector::new();
    let client = Client::builder(TokioExecutor::new()).build::<_, Empty<Bytes>>(connector);

    let req = hyper::Request::builder()
        .uri(uri)
        .body(Empty::new())
        .map_err(|e| GcsHelperError::HttpRequest {
            source: Box::new(e),
        })?;

    let response = tokio::time::timeout(PROBE_TIMEOUT, client.request(req))
        .await
        .map_err(|_| GcsHelperError::HttpRequest {
            source: "health check timed out after 10s".into(),
        })?
        .map_err(|e| GcsHelperError::HttpRequest {
            source: Box::new(e),
        })?;

    if response.status() != StatusCode::OK {
        return Err(GcsHelperError::HealthCheckFailed(response.status()));
    }

    println!("\u{2713} gcs-helper is alive ({})", args.url);
    Ok(())
}

fn probe_url(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}
