//! Configuration loading and validation.
//!
//! Defines the [`ConfigSource`] trait for pluggable config backends and
//! [`load`], which resolves the configuration file to use (explicit path
//! or auto-detected in the working directory) and falls back to built-in
//! defaults when there is none. The result is not validated here: CLI and
//! environment overrides are applied on top first, then
//! [`validation::validate`] runs on the merged value.

pub mod model;
pub mod sources;
pub mod validation;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::GcsHelperError;
use model::Config;

/// File names probed, in order, when no config path is given.
pub const CANDIDATES: &[&str] = &[
    "gcs-helper.yaml",
    "gcs-helper.yml",
    "gcs-helper.json",
    "gcs-helper.toml",
];

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits (Rust 1.75+) does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self) -> Result<Config, GcsHelperError>;
}

/// Load the configuration from `explicit`, an auto-detected file, or defaults.
///
/// Also returns a description of where it came from (`yaml:gcs-helper.yaml`
/// or `defaults`). Logging is not set up yet at this point, so callers
/// report it once the subscriber exists.
pub async fn load(explicit: Option<&Path>) -> Result<(Config, String), GcsHelperError> {
    let Some(path) = resolve_path(explicit).await else {
        return Ok((Config::default(), "defaults".to_string()));
    };
    let source = create_file_source(&path)?;
    let config = source.load().await?;
    Ok((config, format!("{}:{}", source.name(), path.display())))
}

async fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    for name in CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Some(path);
        }
    }

    None
}

fn create_file_source(path: &Path) -> Result<Box<dyn ConfigSource>, GcsHelperError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Box::new(sources::yaml::new(path.to_path_buf()))),

        #[cfg(feature = "json")]
        "json" => Ok(Box::new(sources::json::new(path.to_path_buf()))),

        #[cfg(feature = "toml")]
        "toml" => Ok(Box::new(sources::toml_source::new(path.to_path_buf()))),

        other => Err(GcsHelperError::UnsupportedFormat(other.to_string())),
    }
}
