//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, init, validate, health), and their associated
//! argument structs. Running without a subcommand starts the server with
//! the top-level [`RunArgs`]. Every server flag has an environment
//! variable equivalent for container deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "gcs-helper",
    version,
    about = "Read-only HTTP proxy in front of Google Cloud Storage buckets",
    propagate_version = true,
    args_conflicts_with_subcommands = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        gcs-helper init                                  Create a starter config\n  \
        gcs-helper --bucket-name assets --proxy-endpoint /proxy\n  \
        gcs-helper run -c gcs-helper.yaml                Start with a specific config"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(Box<RunArgs>),

    /// Generate a starter config file
    Init(InitArgs),

    /// Validate a config file without starting
    Validate(ValidateArgs),

    /// Check liveness of a running instance
    Health(HealthArgs),
}

#[derive(Args, Default)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        gcs-helper run                                          Auto-detect config\n  \
        gcs-helper run -c gcs-helper.yaml --pretty               Local dev mode\n  \
        gcs-helper run --bucket-name assets --proxy-endpoint /p  Flags only")]
pub struct RunArgs {
    /// Config file path (.yaml, .json, .toml)
    #[arg(short, long, env = "GCS_HELPER_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(long, env = "GCS_HELPER_LISTEN")]
    pub listen: Option<String>,

    /// Bucket to proxy to
    #[arg(long, env = "GCS_HELPER_BUCKET_NAME")]
    pub bucket_name: Option<String>,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "GCS_HELPER_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Proxy --
    /// URL prefix served by the proxy
    #[arg(long, env = "GCS_HELPER_PROXY_ENDPOINT", help_heading = "Proxy")]
    pub proxy_endpoint: Option<String>,

    /// Per-request proxy timeout in milliseconds
    #[arg(long, env = "GCS_HELPER_PROXY_TIMEOUT_MS", help_heading = "Proxy")]
    pub proxy_timeout: Option<u64>,

    /// Request headers mirrored into access log entries
    #[arg(
        long,
        env = "GCS_HELPER_PROXY_LOG_HEADERS",
        value_delimiter = ',',
        help_heading = "Proxy"
    )]
    pub log_headers: Option<Vec<String>>,

    /// Keep the bucket name in the request path instead of the host
    #[arg(
        long,
        env = "GCS_HELPER_PROXY_BUCKET_ON_PATH",
        num_args = 0..=1,
        default_missing_value = "true",
        help_heading = "Proxy"
    )]
    pub bucket_on_path: Option<bool>,

    // -- Map --
    /// URL prefix served by the map handler
    #[arg(long, env = "GCS_HELPER_MAP_ENDPOINT", help_heading = "Map")]
    pub map_endpoint: Option<String>,

    // -- Upstream client --
    /// Overall upstream client timeout in milliseconds
    #[arg(long, env = "GCS_CLIENT_TIMEOUT_MS", help_heading = "Upstream client")]
    pub client_timeout: Option<u64>,

    /// Idle upstream connection timeout in milliseconds
    #[arg(
        long,
        env = "GCS_CLIENT_IDLE_CONN_TIMEOUT_MS",
        help_heading = "Upstream client"
    )]
    pub idle_conn_timeout: Option<u64>,

    /// Max idle upstream connections kept in the pool
    #[arg(long, env = "GCS_CLIENT_MAX_IDLE_CONNS", help_heading = "Upstream client")]
    pub max_idle_conns: Option<usize>,

    /// OAuth2 access token sent to the storage service
    #[arg(
        long,
        env = "GCS_HELPER_ACCESS_TOKEN",
        hide_env_values = true,
        help_heading = "Upstream client"
    )]
    pub access_token: Option<String>,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        gcs-helper init                            Quick start config (yaml)\n  \
        gcs-helper init -f toml -o config.toml     TOML format\n  \
        gcs-helper init --full                     Every option, documented")]
pub struct InitArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include full documentation as comments
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Config file to validate
    #[arg(default_value = "gcs-helper.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8080")]
    pub url: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }

    /// Whether successful requests get an access log entry.
    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        matches!(self, Self::Trace | Self::Debug)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
