//! `rpack run` — load, stage, execute, and commit a pack's config.

use anyhow::{Context, Result};
use rpack_core::{CancelToken, Executor, LocalFetcher, NoSchema};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub async fn run(config: &Path, working_dir: Option<PathBuf>, force: bool, dry_run: bool) -> Result<()> {
    let exec_path = working_dir.unwrap_or_else(|| {
        config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let executor = Executor::new(config, exec_path, Arc::new(LocalFetcher::new()), Arc::new(NoSchema));
    let report = executor
        .run(force, dry_run, CancelToken::new())
        .await
        .with_context(|| format!("run failed for '{}'", config.display()))?;

    if report.dry_run {
        println!("dry run: would add {} file(s), remove {} file(s)", report.added.len(), report.removed.len());
    } else {
        println!("committed: added {} file(s), removed {} file(s)", report.added.len(), report.removed.len());
    }
    for path in &report.added {
        println!("  + {path}");
    }
    for path in &report.removed {
        println!("  - {path}");
    }

    Ok(())
}
