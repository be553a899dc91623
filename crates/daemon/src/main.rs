use anyhow::{anyhow, Result};
use clap::Parser;

mod cli;

use cli::op::{Op, OpContext};
use cli::Cli;
use secretfs_daemon::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(source) = &cli.source {
        config.source_path = Some(source.clone());
    }
    if let Some(interval) = cli.interval {
        config.refresh_interval_secs = interval;
    }

    secretfs_daemon::logging::init(&config.log_level)?;

    let source_path = config
        .source_path
        .clone()
        .ok_or_else(|| anyhow!("no secret source configured; pass --source"))?;

    let ctx = OpContext::new(config, source_path);
    let output = cli.command.execute(&ctx).await?;
    println!("{}", output);

    Ok(())
}
