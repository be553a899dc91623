use std::path::PathBuf;

use clap::Parser;

pub mod op;
pub mod ops;

#[derive(Parser, Debug)]
#[command(name = "secretfs", version, about = "Serve cached secrets as files")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "SECRETFS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// JSON secret listing to serve (overrides the config file)
    #[arg(short, long, env = "SECRETFS_SOURCE", global = true)]
    pub source: Option<PathBuf>,

    /// Seconds between refreshes (overrides the config file)
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    #[command(subcommand)]
    pub command: ops::Command,
}
