//! Serde data structures for the gcs-helper configuration file.
//!
//! Contains [`Config`] (the root) and its sections [`UpstreamConfig`],
//! [`ClientConfig`], [`ProxyConfig`], and [`MapConfig`]. All types derive
//! `Serialize` and `Deserialize` with `deny_unknown_fields` for strict
//! parsing; every field has a default so an empty file is a valid start.
//! Durations are expressed in milliseconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::LogLevel;

pub const DEFAULT_STORAGE_HOST: &str = "storage.googleapis.com";

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_host() -> String {
    DEFAULT_STORAGE_HOST.to_string()
}

const fn default_client_timeout() -> u64 {
    2000
}

const fn default_idle_conn_timeout() -> u64 {
    120_000
}

const fn default_max_idle_conns() -> usize {
    10
}

const fn default_proxy_timeout() -> u64 {
    10_000
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub bucket_name: String,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub map: MapConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            bucket_name: String::new(),
            log_level: LogLevel::default(),
            upstream: UpstreamConfig::default(),
            client: ClientConfig::default(),
            proxy: ProxyConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl Config {
    /// Deadline applied to one proxied request, from issuing the upstream
    /// call to the last body byte. The overall client timeout caps the
    /// proxy timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.proxy.timeout.min(self.client.timeout))
    }

    /// Map endpoint prefix, treating an empty string as unset.
    #[must_use]
    pub fn map_endpoint(&self) -> Option<&str> {
        self.map.endpoint.as_deref().filter(|e| !e.is_empty())
    }
}

/// Where the storage service lives.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
        }
    }
}

/// Tuning for the shared upstream HTTP client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_client_timeout")]
    pub timeout: u64,

    #[serde(default = "default_idle_conn_timeout")]
    pub idle_conn_timeout: u64,

    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: usize,

    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: default_client_timeout(),
            idle_conn_timeout: default_idle_conn_timeout(),
            max_idle_conns: default_max_idle_conns(),
            access_token: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_conn_timeout)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_proxy_timeout")]
    pub timeout: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_headers: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub bucket_on_path: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout: default_proxy_timeout(),
            log_headers: Vec::new(),
            bucket_on_path: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}
