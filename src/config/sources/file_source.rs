//! Generic async file-based config source.
//!
//! [`FileSource`] implements [`ConfigSource`] for any file format by
//! accepting a deserialization function at construction time. It reads
//! the file asynchronously via Tokio and parses it; validation happens
//! later, once overrides have been merged in.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::model::Config;
use crate::config::ConfigSource;
use crate::error::GcsHelperError;

pub struct FileSource {
    path: PathBuf,
    name: &'static str,
    deserialize: fn(&str) -> Result<Config, Box<dyn std::error::Error + Send + Sync>>,
}

impl FileSource {
    #[must_use]
    pub fn new(
        path: PathBuf,
        name: &'static str,
        deserialize: fn(&str) -> Result<Config, Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            path,
            name,
            deserialize,
        }
    }

    async fn read_content(&self) -> Result<String, GcsHelperError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GcsHelperError::ConfigFileNotFound {
                    path: self.path.clone(),
                }
            } else {
                GcsHelperError::Io(e)
            }
        })
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn load(&self) -> Result<Config, GcsHelperError> {
        let content = self.read_content().await?;

        (self.deserialize)(&content).map_err(|e| GcsHelperError::ConfigParse {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}
