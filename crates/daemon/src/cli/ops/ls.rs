use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;

use secretfs_daemon::fs::{FileAttr, FileKind};
use secretfs_daemon::refresh::RefreshError;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Ls {}

#[derive(Debug)]
pub struct LsEntry {
    pub name: String,
    pub attr: FileAttr,
}

#[derive(Debug)]
pub struct LsOutput {
    pub entries: Vec<LsEntry>,
}

impl fmt::Display for LsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "no secrets");
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let mtime: DateTime<Utc> = entry.attr.mtime.into();
            write!(
                f,
                "{:o} {:>5} {:>5} {:>8} {} {}",
                entry.attr.perm,
                entry.attr.uid,
                entry.attr.gid,
                entry.attr.size,
                mtime.to_rfc3339_opts(SecondsFormat::Secs, true),
                entry.name
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("refresh failed: {0}")]
    Refresh(#[from] RefreshError),
}

#[async_trait::async_trait]
impl Op for Ls {
    type Error = LsError;
    type Output = LsOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        ctx.prime().await?;

        let entries = ctx
            .fs
            .readdir()
            .into_iter()
            .filter(|entry| entry.kind == FileKind::RegularFile)
            // a concurrent refresh may have dropped the name since readdir
            .filter_map(|entry| {
                let attr = ctx.fs.lookup(&entry.name)?;
                Some(LsEntry {
                    name: entry.name,
                    attr,
                })
            })
            .collect();

        Ok(LsOutput { entries })
    }
}
