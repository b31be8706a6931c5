//! rpack - sandboxed pack runner
//!
//! Thin command-line front end over `rpack-core`'s `Executor`: parses
//! arguments, wires up the concrete `Fetcher`/`ValuesSchema` collaborators,
//! and maps `Result<_, CoreError>` to a process exit code.

pub mod cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rpack")]
#[command(author, version, about = "Run and verify RPack packs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a pack's config, staging and committing its effects
    Run {
        /// Path to the pack's `NAME.rpack.yaml` config file
        config: PathBuf,
        /// Directory the run operates against (defaults to the config's parent)
        #[arg(short = 'w', long)]
        working_dir: Option<PathBuf>,
        /// Overwrite files that were modified or would collide since the last run
        #[arg(short, long)]
        force: bool,
        /// Compute the run's effects without touching the working directory
        #[arg(long)]
        dry_run: bool,
    },
    /// Verify the working directory still matches the last committed run
    Check {
        /// Path to the pack's `NAME.rpack.yaml` config file
        config: PathBuf,
        /// Directory the run operates against (defaults to the config's parent)
        #[arg(short = 'w', long)]
        working_dir: Option<PathBuf>,
    },
}
