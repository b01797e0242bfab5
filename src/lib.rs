//! gcs-helper is a read-only HTTP front for a Google Cloud Storage bucket.
//!
//! Requests under a configured path prefix are rewritten and forwarded to
//! the storage service, with the bucket either in the host name or in the
//! path. A second prefix can be handed to an embedder-supplied map
//! handler, and `/` answers as a liveness probe.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Configuration loading and validation via the
//!   [`ConfigSource`](config::ConfigSource) trait.
//! - [`dispatch`] -- Prefix routing of every inbound request.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`access_log`] -- Per-request access log and status capture.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Upstream URL construction, header copying, pooled client,
//!   and the deadline-bounded streamed response.
//! - [`server`] -- Axum server setup, shared application state, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod access_log;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod server;
