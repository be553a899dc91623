use std::fmt;

use bytes::Bytes;
use clap::Args;

use secretfs_daemon::refresh::RefreshError;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Secret name
    pub name: String,
}

#[derive(Debug)]
pub struct CatOutput {
    pub name: String,
    pub content: Bytes,
}

impl fmt::Display for CatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.content) {
            Ok(text) => write!(f, "{text}"),
            Err(_) => {
                let hex = self
                    .content
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "{hex}")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error("refresh failed: {0}")]
    Refresh(#[from] RefreshError),
    #[error("no such secret: {0}")]
    NotFound(String),
}

#[async_trait::async_trait]
impl Op for Cat {
    type Error = CatError;
    type Output = CatOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        ctx.prime().await?;

        let content = ctx
            .fs
            .read(&self.name, 0, u32::MAX)
            .ok_or_else(|| CatError::NotFound(self.name.clone()))?;

        Ok(CatOutput {
            name: self.name.clone(),
            content,
        })
    }
}
