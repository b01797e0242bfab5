//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared, read-only state holding the
//! configuration, the upstream client, and the map handler),
//! [`build_router`] for constructing the Axum router with middleware
//! layers, and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::model::Config;
use crate::dispatch;
use crate::proxy::client::UpstreamClient;

pub struct AppState {
    pub config: Arc<Config>,
    pub client: UpstreamClient,
    /// Receives requests under the map endpoint, prefix already stripped.
    pub map: Router,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<Config>, client: UpstreamClient, map: Router) -> Self {
        Self {
            config,
            client,
            map,
        }
    }
}

/// Every request goes through [`dispatch::dispatch`]; there are no
/// framework-level routes. The trace layer only opens a span per request,
/// events come from the access log.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(dispatch::dispatch)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .on_request(())
                    .on_response(())
                    .on_body_chunk(())
                    .on_eos(())
                    .on_failure(()),
            ),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
