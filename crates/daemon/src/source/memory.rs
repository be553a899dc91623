use async_trait::async_trait;
use common::secret::Secret;
use parking_lot::Mutex;

use super::{SecretSource, SourceError};

#[derive(Debug, Default)]
struct Inner {
    secrets: Vec<Secret>,
    failure: Option<String>,
}

/// In-memory secret source
///
/// The secret set can be swapped at any time, and the source can be told to
/// fail until it is told to recover.
#[derive(Debug, Default)]
pub struct MemorySource {
    inner: Mutex<Inner>,
}

impl MemorySource {
    pub fn new(secrets: Vec<Secret>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                secrets,
                failure: None,
            }),
        }
    }

    /// Replace the secret set served by subsequent fetches
    pub fn set(&self, secrets: Vec<Secret>) {
        self.inner.lock().secrets = secrets;
    }

    /// Make subsequent fetches fail with the given reason
    pub fn fail(&self, reason: impl Into<String>) {
        self.inner.lock().failure = Some(reason.into());
    }

    pub fn recover(&self) {
        self.inner.lock().failure = None;
    }
}

#[async_trait]
impl SecretSource for MemorySource {
    async fn fetch_all(&self) -> Result<Vec<Secret>, SourceError> {
        let inner = self.inner.lock();
        match &inner.failure {
            Some(reason) => Err(SourceError::Unavailable(reason.clone())),
            None => Ok(inner.secrets.clone()),
        }
    }
}
