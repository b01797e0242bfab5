//! `gcs-helper run` — start the proxy server.
//!
//! Loads the configuration file (or defaults), applies CLI and
//! environment overrides, validates the result, and serves it with
//! graceful shutdown. The configuration is frozen behind an `Arc` from
//! here on.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use crate::cli::RunArgs;
use crate::config::model::Config;
use crate::config::{self, validation};
use crate::error::GcsHelperError;
use crate::logging;
use crate::proxy::client::UpstreamClient;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), GcsHelperError> {
    let (mut config, source_name) = config::load(args.config.as_deref()).await?;
    apply_overrides(&args, &mut config);

    if let Err(errors) = validation::validate(&config) {
        return Err(GcsHelperError::ConfigValidation { errors });
    }

    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&config.log_level, log_format);

    warn_on_overlapping_prefixes(&config);

    let client = UpstreamClient::new(&config.client)?;
    let addr: SocketAddr = config.listen.parse()?;
    let config = Arc::new(config);

    // No map handler ships with this binary; embedders pass their own
    // router to `AppState::new`.
    let state = Arc::new(AppState::new(Arc::clone(&config), client, Router::new()));
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %listener.local_addr()?,
        config = %source_name,
        proxy_endpoint = %config.proxy.endpoint,
        map_endpoint = config.map_endpoint().unwrap_or("disabled"),
        bucket = %config.bucket_name,
        bucket_on_path = config.proxy.bucket_on_path,
        upstream = %format!("{}://{}", config.upstream.scheme, config.upstream.host),
        timeout_ms = config.request_timeout().as_millis(),
        git = env!("GCS_HELPER_GIT_SHORT"),
        "gcs-helper started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("gcs-helper stopped");
    Ok(())
}

/// Flags and environment variables win over the config file.
pub fn apply_overrides(args: &RunArgs, config: &mut Config) {
    if let Some(listen) = &args.listen {
        config.listen.clone_from(listen);
    }
    if let Some(bucket) = &args.bucket_name {
        config.bucket_name.clone_from(bucket);
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(endpoint) = &args.proxy_endpoint {
        config.proxy.endpoint.clone_from(endpoint);
    }
    if let Some(timeout) = args.proxy_timeout {
        config.proxy.timeout = timeout;
    }
    if let Some(headers) = &args.log_headers {
        config.proxy.log_headers = headers
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
    }
    if let Some(on_path) = args.bucket_on_path {
        config.proxy.bucket_on_path = on_path;
    }
    if let Some(endpoint) = &args.map_endpoint {
        config.map.endpoint = Some(endpoint.clone());
    }
    if let Some(timeout) = args.client_timeout {
        config.client.timeout = timeout;
    }
    if let Some(idle) = args.idle_conn_timeout {
        config.client.idle_conn_timeout = idle;
    }
    if let Some(max) = args.max_idle_conns {
        config.client.max_idle_conns = max;
    }
    if let Some(token) = &args.access_token {
        config.client.access_token = Some(token.clone());
    }
}

fn warn_on_overlapping_prefixes(config: &Config) {
    let Some(map) = config.map_endpoint() else {
        return;
    };
    let proxy = config.proxy.endpoint.as_str();
    if map.starts_with(proxy) || proxy.starts_with(map) {
        tracing::warn!(
            proxy_endpoint = %proxy,
            map_endpoint = %map,
            "endpoint prefixes overlap; the proxy endpoint takes precedence"
        );
    }
}
