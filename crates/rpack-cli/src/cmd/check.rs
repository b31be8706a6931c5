//! `rpack check` — verify the working directory still matches the last
//! committed run, without executing anything.

use anyhow::{Context, Result};
use rpack_core::{CancelToken, Executor, LocalFetcher, NoSchema};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub async fn check(config: &Path, working_dir: Option<PathBuf>) -> Result<()> {
    let exec_path = working_dir.unwrap_or_else(|| {
        config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let executor = Executor::new(config, exec_path, Arc::new(LocalFetcher::new()), Arc::new(NoSchema));
    let report = executor
        .check(CancelToken::new())
        .await
        .with_context(|| format!("check failed for '{}'", config.display()))?;

    println!("ok: {} file(s) unchanged since last run", report.unchanged.len());
    Ok(())
}
