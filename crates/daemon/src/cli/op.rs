use std::path::PathBuf;
use std::sync::Arc;

use common::cache::SecretMap;

use secretfs_daemon::refresh::RefreshError;
use secretfs_daemon::{Config, FileSource, RefreshReport, Refresher, SecretFs, SecretSource};

/// Shared state handed to every op
#[derive(Debug, Clone)]
pub struct OpContext {
    pub config: Config,
    pub live: Arc<SecretMap>,
    pub source: Arc<dyn SecretSource>,
    pub fs: Arc<SecretFs>,
}

impl OpContext {
    pub fn new(config: Config, source_path: PathBuf) -> Self {
        Self::with_source(config, Arc::new(FileSource::new(source_path)))
    }

    pub fn with_source(config: Config, source: Arc<dyn SecretSource>) -> Self {
        let live = Arc::new(SecretMap::new());
        let fs = Arc::new(SecretFs::new(
            Arc::clone(&live),
            config.ownership(),
            config.attr_ttl(),
        ));
        Self {
            config,
            live,
            source,
            fs,
        }
    }

    /// A refresher feeding this context's live map
    pub fn refresher(&self) -> Refresher {
        Refresher::new(
            Arc::clone(&self.live),
            Arc::clone(&self.source),
            self.config.refresh_config(),
        )
    }

    /// Run one refresh so one-shot ops have something to show
    pub async fn prime(&self) -> Result<RefreshReport, RefreshError> {
        self.refresher().refresh_once().await
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: std::fmt::Display + std::fmt::Debug + Send;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Generate a `Command` subcommand enum plus matching `OpOutput`/`OpError`
/// enums that dispatch to each variant's [`Op`] impl.
#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(clap::Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(OpOutput::$variant(output) => write!(f, "{}", output),)*
                }
            }
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Error = OpError;
            type Output = OpOutput;

            async fn execute(
                &self,
                ctx: &$crate::cli::op::OpContext,
            ) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => op
                            .execute(ctx)
                            .await
                            .map(OpOutput::$variant)
                            .map_err(OpError::$variant),
                    )*
                }
            }
        }
    };
}
