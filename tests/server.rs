//! Integration tests for the dispatcher, the proxy path, and graceful
//! shutdown, against an in-process stand-in for the storage service.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use gcs_helper::config::model::Config;
use gcs_helper::dispatch::MapRemainder;
use gcs_helper::proxy::client::UpstreamClient;
use gcs_helper::server::{self, AppState};

#[derive(Clone, Default)]
struct Upstream {
    hits: Arc<AtomicUsize>,
}

async fn storage(
    axum::extract::State(upstream): axum::extract::State<Upstream>,
    req: Request,
) -> Response {
    upstream.hits.fetch_add(1, Ordering::SeqCst);

    let seen = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-upstream-path",
        HeaderValue::from_str(&seen).unwrap_or(HeaderValue::from_static("?")),
    );
    if let Some(range) = req.headers().get("range") {
        headers.insert("x-echo-range", range.clone());
    }

    match req.uri().path() {
        "/assets/missing.txt" => (StatusCode::NOT_FOUND, headers, "no such object").into_response(),
        "/assets/slow.txt" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (headers, "too late").into_response()
        }
        "/assets/multi.txt" => {
            headers.append("x-goog-hash", HeaderValue::from_static("crc32c=abc"));
            headers.append("x-goog-hash", HeaderValue::from_static("md5=def"));
            (headers, "multi").into_response()
        }
        _ => (headers, "hello").into_response(),
    }
}

async fn start_upstream() -> (SocketAddr, Upstream) {
    let upstream = Upstream::default();
    let router = Router::new()
        .fallback(storage)
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, upstream)
}

fn test_config(upstream: SocketAddr) -> Config {
    let mut config = Config::default();
    config.upstream.scheme = "http".into();
    config.upstream.host = upstream.to_string();
    config.proxy.endpoint = "/proxy".into();
    config.proxy.bucket_on_path = true;
    config.proxy.timeout = 300;
    config.proxy.log_headers = vec!["X-Request-Id".into()];
    config.map.endpoint = Some("/map".into());
    config
}

async fn lookup() -> &'static str {
    "mapped"
}

/// Echoes the rooted path, the query and the raw remainder.
async fn map_echo(req: Request) -> String {
    let remainder = req
        .extensions()
        .get::<MapRemainder>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "<none>".into());
    format!(
        "path={} query={} remainder={remainder}",
        req.uri().path(),
        req.uri().query().unwrap_or("")
    )
}

async fn start_server(config: Config) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let client = UpstreamClient::new(&config.client).unwrap();
    let map = Router::new()
        .route("/lookup", get(lookup))
        .route("/", get(map_echo))
        .route("/foo", get(map_echo));
    let state = Arc::new(AppState::new(Arc::new(config), client, map));
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

async fn setup() -> (SocketAddr, Upstream, tokio::sync::oneshot::Sender<()>) {
    let (upstream_addr, upstream) = start_upstream().await;
    let (addr, shutdown) = start_server(test_config(upstream_addr)).await;
    (addr, upstream, shutdown)
}

#[tokio::test]
async fn root_is_a_liveness_probe() {
    let (addr, upstream, shutdown) = setup().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.bytes().await.unwrap().is_empty());

    let resp = client.head(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn unmatched_path_is_404() {
    let (addr, upstream, shutdown) = setup().await;

    let resp = reqwest::get(format!("http://{addr}/elsewhere")).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn get_is_forwarded_with_rewritten_path() {
    let (addr, upstream, shutdown) = setup().await;

    let resp = reqwest::get(format!("http://{addr}/proxy/assets/a.txt?alt=media"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["x-upstream-path"],
        "/assets/a.txt?alt=media"
    );
    assert_eq!(resp.text().await.unwrap(), "hello");

    // Missing separator after the prefix is inserted.
    let resp = reqwest::get(format!("http://{addr}/proxyassets/a.txt"))
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-upstream-path"], "/assets/a.txt");

    assert_eq!(upstream.hits.load(Ordering::SeqCst), 2);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn bare_proxy_prefix_answers_without_upstream_call() {
    let (addr, upstream, shutdown) = setup().await;

    let resp = reqwest::get(format!("http://{addr}/proxy")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.bytes().await.unwrap().is_empty());
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn write_methods_are_rejected_before_upstream() {
    let (addr, upstream, shutdown) = setup().await;
    let client = reqwest::Client::new();

    for method in [reqwest::Method::POST, reqwest::Method::PUT, reqwest::Method::DELETE] {
        let resp = client
            .request(method, format!("http://{addr}/proxy/assets/a.txt"))
            .body("payload")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.text().await.unwrap(), "method not allowed\n");
    }

    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn head_is_forwarded_without_body() {
    let (addr, upstream, shutdown) = setup().await;

    let resp = reqwest::Client::new()
        .head(format!("http://{addr}/proxy/assets/a.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-upstream-path"], "/assets/a.txt");
    assert!(resp.bytes().await.unwrap().is_empty());
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn upstream_status_and_body_pass_through() {
    let (addr, _upstream, shutdown) = setup().await;

    let resp = reqwest::get(format!("http://{addr}/proxy/assets/missing.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "no such object");
    let _ = shutdown.send(());
}

#[tokio::test]
async fn request_and_response_headers_are_copied() {
    let (addr, _upstream, shutdown) = setup().await;

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/proxy/assets/multi.txt"))
        .header("range", "bytes=0-3")
        .header("x-request-id", "req-1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-echo-range"], "bytes=0-3");

    let hashes: Vec<_> = resp
        .headers()
        .get_all("x-goog-hash")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(hashes, vec!["crc32c=abc", "md5=def"]);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn slow_upstream_fails_with_500_at_deadline() {
    let (addr, _upstream, shutdown) = setup().await;

    let started = Instant::now();
    let resp = reqwest::get(format!("http://{addr}/proxy/assets/slow.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert!(resp.text().await.unwrap().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(3));
    let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_upstream_fails_with_500() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let (addr, shutdown) = start_server(test_config(dead)).await;

    let resp = reqwest::get(format!("http://{addr}/proxy/assets/a.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert!(!resp.text().await.unwrap().is_empty());
    let _ = shutdown.send(());
}

#[tokio::test]
async fn map_prefix_is_delegated() {
    let (addr, upstream, shutdown) = setup().await;

    let resp = reqwest::get(format!("http://{addr}/map/lookup")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "mapped");

    let resp = reqwest::get(format!("http://{addr}/map/unknown")).await.unwrap();
    assert_eq!(resp.status(), 404);

    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn bare_and_slashless_map_paths_reach_map_handler() {
    let (addr, upstream, shutdown) = setup().await;

    let cases = [
        ("/map", "path=/ query= remainder="),
        ("/map?x=1", "path=/ query=x=1 remainder="),
        ("/mapfoo", "path=/foo query= remainder=foo"),
        ("/map/foo", "path=/foo query= remainder=/foo"),
    ];
    for (path, expected) in cases {
        let resp = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
        assert_eq!(resp.status(), 200, "{path}");
        assert_eq!(resp.text().await.unwrap(), expected, "{path}");
    }

    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_stops_server() {
    let (addr, _upstream, shutdown) = setup().await;

    let resp = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(resp.status(), 200);

    shutdown.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = reqwest::Client::new()
        .get(format!("http://{addr}/"))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(result.is_err());
}
