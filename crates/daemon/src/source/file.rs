use std::path::{Path, PathBuf};

use async_trait::async_trait;
use common::secret::{parse_secret_list, Secret};

use super::{SecretSource, SourceError};

/// Reads a JSON secret listing from disk on every fetch
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SecretSource for FileSource {
    async fn fetch_all(&self) -> Result<Vec<Secret>, SourceError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let secrets = parse_secret_list(&data)?;
        tracing::debug!(
            "read {} secrets from {}",
            secrets.len(),
            self.path.display()
        );
        Ok(secrets)
    }
}
