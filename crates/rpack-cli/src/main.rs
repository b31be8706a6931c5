//! rpack - sandboxed pack runner

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rpack_cli::cmd;
use rpack_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            working_dir,
            force,
            dry_run,
        } => cmd::run::run(&config, working_dir, force, dry_run).await,
        Commands::Check { config, working_dir } => cmd::check::check(&config, working_dir).await,
    }
}
