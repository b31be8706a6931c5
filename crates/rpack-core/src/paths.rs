//! On-disk layout derivation for a single run (`spec.md` §3 "Run layout",
//! §4.6 step 2, §6.1 "Cache layout").
//!
//! Grounded on the teacher's `paths.rs`: one module owning every derived
//! path so the rest of the crate never hand-rolls a `.join()` chain against
//! `exec_path`.

use rpack_schema::hash::Sha256Hex;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = ".rpack.d";

/// The full set of directories a single run operates against.
///
/// `exec_path` is the directory holding the config file, i.e. the
/// caller-supplied `--working-dir` (or the config's parent directory).
/// `source_path`, `run_path`, and `temp_path` are all rooted under
/// `exec_path/.rpack.d/sha256(source)/...` as specified in §6.1.
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub exec_path: PathBuf,
    pub source_path: PathBuf,
    pub run_path: PathBuf,
    pub temp_path: PathBuf,
    pub cache_path: PathBuf,
}

impl RunLayout {
    /// Derive the full layout for a config file at `config_path`, rooted at
    /// `exec_path`.
    pub fn derive(exec_path: &Path, config_path: &Path, source: &str) -> Self {
        let cache_path = Self::cache_root(exec_path, source);
        let invocation_key = Sha256Hex::compute(config_path.to_string_lossy().as_bytes());
        let invocation_root = cache_path.join(invocation_key.as_str());

        Self {
            exec_path: exec_path.to_path_buf(),
            source_path: cache_path.join("source"),
            run_path: invocation_root.join("run"),
            temp_path: invocation_root.join("tmp"),
            cache_path,
        }
    }

    /// `exec_path/.rpack.d/sha256(source)`.
    pub fn cache_root(exec_path: &Path, source: &str) -> PathBuf {
        exec_path
            .join(CACHE_DIR_NAME)
            .join(Sha256Hex::compute(source.as_bytes()).as_str())
    }

    /// Wipe and recreate `run_path` and `temp_path`, creating `source_path`'s
    /// parent if necessary. Called at the start of every run (`spec.md`
    /// §4.6 step 2).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if any directory cannot be removed or created.
    pub fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.source_path)?;
        for dir in [&self.run_path, &self.temp_path] {
            if dir.exists() {
                std::fs::remove_dir_all(dir)?;
            }
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic_for_same_inputs() {
        let exec = Path::new("/proj");
        let config = Path::new("/proj/demo.rpack.yaml");
        let a = RunLayout::derive(exec, config, "file:///pack");
        let b = RunLayout::derive(exec, config, "file:///pack");
        assert_eq!(a.run_path, b.run_path);
        assert_eq!(a.temp_path, b.temp_path);
        assert_eq!(a.source_path, b.source_path);
    }

    #[test]
    fn different_sources_get_different_cache_roots() {
        let exec = Path::new("/proj");
        let config = Path::new("/proj/demo.rpack.yaml");
        let a = RunLayout::derive(exec, config, "file:///pack-a");
        let b = RunLayout::derive(exec, config, "file:///pack-b");
        assert_ne!(a.cache_path, b.cache_path);
    }

    #[test]
    fn different_configs_get_different_run_paths_under_same_cache() {
        let exec = Path::new("/proj");
        let a = RunLayout::derive(exec, Path::new("/proj/a.rpack.yaml"), "file:///pack");
        let b = RunLayout::derive(exec, Path::new("/proj/b.rpack.yaml"), "file:///pack");
        assert_eq!(a.cache_path, b.cache_path);
        assert_ne!(a.run_path, b.run_path);
    }

    #[test]
    fn prepare_creates_and_resets_staging_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::derive(dir.path(), &dir.path().join("x.rpack.yaml"), "s");
        layout.prepare().unwrap();
        assert!(layout.run_path.is_dir());
        assert!(layout.temp_path.is_dir());

        std::fs::write(layout.run_path.join("stale.txt"), "old").unwrap();
        layout.prepare().unwrap();
        assert!(!layout.run_path.join("stale.txt").exists());
    }
}
