//! The bundle fetcher boundary: acquiring a pack's source directory from a
//! `source:` URL (`spec.md` §1 "out of scope... the bundle fetcher
//! (git/https/s3/local) supplying a pre-materialized source directory",
//! §4.6 step 2).
//!
//! Grounded on `apl-core::io::download`'s trait boundary for
//! external-artifact acquisition: the concrete transport (git clone, HTTPS
//! GET, S3 object fetch) is a collaborator this crate only calls through a
//! trait, the same way the teacher isolates its CDN/registry downloads
//! behind `apl_core::io::download`'s interface rather than hand-rolling
//! network code inline in the executor.

use crate::cancel::CancelToken;
use std::path::Path;
use thiserror::Error;

/// Failure acquiring a pack's source directory.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to fetch pack source '{source_url}': {reason}")]
    Failed { source_url: String, reason: String },

    #[error("fetch of '{source_url}' was cancelled")]
    Cancelled { source_url: String },
}

/// Acquires a pack's source directory for a `source:` URL and materializes
/// it at `dest`. Implementations own the transport (git/https/s3/local);
/// `rpack-core` only depends on this trait.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Populate `dest` with the pack body named by `source`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the source cannot be reached, is malformed,
    /// or the fetch is cancelled via `cancel`.
    async fn fetch(&self, source: &str, dest: &Path, cancel: &CancelToken) -> Result<(), FetchError>;
}

/// Resolves `source` as a local filesystem path (bare path or `file://`
/// URL) and copies its tree into `dest`. The only transport this crate
/// ships a real implementation for; git/https/s3 are collaborators left to
/// the CLI front end or a future crate, per `spec.md` §1.
#[derive(Debug, Default)]
pub struct LocalFetcher;

impl LocalFetcher {
    pub fn new() -> Self {
        Self
    }

    fn resolve_local_path(source: &str) -> &str {
        source.strip_prefix("file://").unwrap_or(source)
    }
}

#[async_trait::async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self, source: &str, dest: &Path, cancel: &CancelToken) -> Result<(), FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                source_url: source.to_string(),
            });
        }

        let src_path = std::path::PathBuf::from(Self::resolve_local_path(source));
        let dest = dest.to_path_buf();
        let source_owned = source.to_string();

        tokio::task::spawn_blocking(move || copy_tree(&src_path, &dest))
            .await
            .map_err(|join_err| FetchError::Failed {
                source_url: source_owned.clone(),
                reason: join_err.to_string(),
            })?
            .map_err(|reason| FetchError::Failed {
                source_url: source_owned,
                reason,
            })
    }
}

fn copy_tree(src: &Path, dest: &Path) -> Result<(), String> {
    if !src.is_dir() {
        return Err(format!("source path '{}' is not a directory", src.display()));
    }
    std::fs::create_dir_all(dest).map_err(|e| e.to_string())?;

    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.map_err(|e| e.to_string())?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir entries are under src");
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| e.to_string())?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copies_bare_local_path() {
        let src = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("files")).unwrap();
        std::fs::write(src.path().join("files/a.txt"), "hello").unwrap();

        let dest = tempfile::tempdir().unwrap();
        let dest_path = dest.path().join("source");

        LocalFetcher::new()
            .fetch(&src.path().display().to_string(), &dest_path, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dest_path.join("files/a.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn copies_file_url() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("x.txt"), "y").unwrap();
        let dest = tempfile::tempdir().unwrap();
        let dest_path = dest.path().join("source");

        let url = format!("file://{}", src.path().display());
        LocalFetcher::new()
            .fetch(&url, &dest_path, &CancelToken::new())
            .await
            .unwrap();

        assert!(dest_path.join("x.txt").exists());
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let dest = tempfile::tempdir().unwrap();
        let result = LocalFetcher::new()
            .fetch("/nonexistent/path", &dest.path().join("source"), &CancelToken::new())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancelled_token_stops_fetch() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = LocalFetcher::new()
            .fetch(&src.path().display().to_string(), &dest.path().join("source"), &cancel)
            .await;
        assert!(matches!(result, Err(FetchError::Cancelled { .. })));
    }
}
