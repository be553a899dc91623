//! Where refresh cycles get their secrets from
//!
//! A [`SecretSource`] hands back the complete, decoded secret set on every
//! call. Sources never touch the cache; the refresher decides what to do
//! with the result.

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;
use common::secret::{Secret, SecretError};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Decode(#[from] SecretError),
    #[error("secret source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SecretSource: Send + Sync + Debug {
    /// Fetch the full current secret set
    async fn fetch_all(&self) -> Result<Vec<Secret>, SourceError>;
}
