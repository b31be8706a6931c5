//! The mediated filesystem: the single surface the script sees
//! (`spec.md` §4.5).
//!
//! Wires together the resolver set, the hook chain, and the recorder:
//! resolve a friendly name, run every hook in order (short-circuit on first
//! failure), then delegate to the handle. Grounded on `diodeinc-pcb`'s
//! `FileProvider` as the single mediating surface, composed here with the
//! teacher's `resolver.rs` ordering idiom.

use crate::cancel::CancelToken;
use crate::error::CoreError;
use crate::handle::{child_handles, DirListing, Handle, Stat};
use crate::hooks::{run_chain, AccessKind, Hook};
use crate::recorder::{Recorder, RecorderRecord};
use crate::resolver::ResolverSet;

/// The script-visible mediated filesystem for one run.
pub struct Fs {
    resolvers: ResolverSet,
    hooks: Vec<Box<dyn Hook>>,
    recorder: Recorder,
    cancel: CancelToken,
}

impl Fs {
    pub fn new(resolvers: ResolverSet, hooks: Vec<Box<dyn Hook>>, cancel: CancelToken) -> Self {
        Self {
            resolvers,
            hooks,
            recorder: Recorder::new(),
            cancel,
        }
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Read the full contents of `friendly`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the path cannot be resolved, a hook denies
    /// the read, the run was cancelled, or the underlying I/O fails.
    pub fn read(&self, friendly: &str) -> Result<Vec<u8>, CoreError> {
        self.cancel.check()?;
        let handle = self.resolvers.resolve(friendly)?;
        run_chain(&self.hooks, AccessKind::Read, handle.resolver_id(), friendly, handle.indirect_target_path())?;
        self.recorder.record(RecorderRecord {
            access_type: AccessKind::Read,
            resolver_id: handle.resolver_id(),
            friendly_path: friendly.to_string(),
            indirect_target_path: handle.indirect_target_path().to_string(),
        });
        Ok(handle.read()?)
    }

    /// Overwrite `friendly` with `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the path cannot be resolved, a hook denies
    /// the write, the run was cancelled, or the underlying I/O fails.
    pub fn write(&self, friendly: &str, bytes: &[u8]) -> Result<(), CoreError> {
        self.cancel.check()?;
        let handle = self.resolvers.resolve(friendly)?;
        run_chain(&self.hooks, AccessKind::Write, handle.resolver_id(), friendly, handle.indirect_target_path())?;
        handle.write(bytes)?;
        self.recorder.record(RecorderRecord {
            access_type: AccessKind::Write,
            resolver_id: handle.resolver_id(),
            friendly_path: friendly.to_string(),
            indirect_target_path: handle.indirect_target_path().to_string(),
        });
        Ok(())
    }

    /// Check existence and kind of `friendly`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the path cannot be resolved, a hook denies
    /// the stat, the run was cancelled, or the underlying I/O fails.
    pub fn stat(&self, friendly: &str) -> Result<Stat, CoreError> {
        self.cancel.check()?;
        let handle = self.resolvers.resolve(friendly)?;
        run_chain(&self.hooks, AccessKind::Stat, handle.resolver_id(), friendly, handle.indirect_target_path())?;
        self.recorder.record(RecorderRecord {
            access_type: AccessKind::Stat,
            resolver_id: handle.resolver_id(),
            friendly_path: friendly.to_string(),
            indirect_target_path: handle.indirect_target_path().to_string(),
        });
        Ok(handle.stat()?)
    }

    /// List the immediate children of `friendly`, as friendly paths split
    /// into files and subdirectories.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the path cannot be resolved, a hook denies
    /// the readdir, the run was cancelled, or the underlying I/O fails.
    pub fn read_dir(&self, friendly: &str) -> Result<DirListing, CoreError> {
        self.cancel.check()?;
        let handle = self.resolvers.resolve(friendly)?;
        run_chain(&self.hooks, AccessKind::Readdir, handle.resolver_id(), friendly, handle.indirect_target_path())?;
        self.recorder.record(RecorderRecord {
            access_type: AccessKind::Readdir,
            resolver_id: handle.resolver_id(),
            friendly_path: friendly.to_string(),
            indirect_target_path: handle.indirect_target_path().to_string(),
        });

        let raw = handle.read_dir()?;
        let (files, dirs) = child_handles(&handle, &raw);
        Ok(DirListing {
            files: files.iter().map(|h| h.friendly_path().to_string()).collect(),
            dirs: dirs.iter().map(|h| h.friendly_path().to_string()).collect(),
        })
    }

    /// Breadth-first traversal of `friendly` using [`Self::read_dir`],
    /// re-entering the FS at every level so hooks apply throughout
    /// (`spec.md` §4.5).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] under the same conditions as [`Self::read_dir`],
    /// for any directory visited during the traversal.
    pub fn read_dir_recursive(&self, friendly: &str) -> Result<DirListing, CoreError> {
        let mut all_files = Vec::new();
        let mut all_dirs = Vec::new();
        let mut queue: std::collections::VecDeque<String> = std::collections::VecDeque::new();
        queue.push_back(friendly.to_string());

        while let Some(dir) = queue.pop_front() {
            let listing = self.read_dir(&dir)?;
            for subdir in &listing.dirs {
                queue.push_back(subdir.clone());
            }
            all_dirs.extend(listing.dirs);
            all_files.extend(listing.files);
        }

        Ok(DirListing {
            files: all_files,
            dirs: all_dirs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{AccessControlHook, PurityHook};
    use crate::inputs::ResolvedInput;
    use rpack_schema::definition::InputKind;

    fn build() -> (tempfile::TempDir, Fs) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("source/files")).unwrap();
        std::fs::write(dir.path().join("source/files/intro.md"), "hello").unwrap();
        std::fs::create_dir_all(dir.path().join("temp")).unwrap();
        std::fs::create_dir_all(dir.path().join("run")).unwrap();

        let resolvers = ResolverSet::new(
            dir.path().join("source"),
            dir.path().join("temp"),
            dir.path().join("run"),
            Vec::<ResolvedInput>::new(),
        );
        let hooks: Vec<Box<dyn Hook>> = vec![Box::new(AccessControlHook), Box::new(PurityHook::new())];
        let fs = Fs::new(resolvers, hooks, CancelToken::new());
        (dir, fs)
    }

    #[test]
    fn read_from_rpack_then_write_to_target_commits() {
        let (dir, fs) = build();
        let bytes = fs.read("rpack:files/intro.md").unwrap();
        fs.write("rpack_intro.md", &bytes).unwrap();

        let staged = std::fs::read(dir.path().join("run/rpack_intro.md")).unwrap();
        assert_eq!(staged, b"hello");
        assert_eq!(fs.recorder().target_write_set(), vec!["rpack_intro.md"]);
    }

    #[test]
    fn write_to_rpack_is_denied() {
        let (_dir, fs) = build();
        assert!(fs.write("rpack:foo", b"x").is_err());
    }

    #[test]
    fn read_from_target_is_denied() {
        let (_dir, fs) = build();
        assert!(fs.read("./foo").is_err());
    }

    #[test]
    fn read_dir_recursive_visits_nested_directories() {
        let (dir, fs) = build();
        std::fs::create_dir_all(dir.path().join("source/files/sub")).unwrap();
        std::fs::write(dir.path().join("source/files/sub/nested.txt"), "x").unwrap();

        let listing = fs.read_dir_recursive("rpack:files").unwrap();
        assert!(listing.files.contains(&"rpack:files/intro.md".to_string()));
        assert!(listing.dirs.contains(&"rpack:files/sub".to_string()));
        assert!(listing.files.contains(&"rpack:files/sub/nested.txt".to_string()));
    }

    #[test]
    fn cancelled_token_stops_subsequent_calls() {
        let (_dir, fs) = build();
        fs.cancel.cancel();
        assert!(matches!(fs.read("rpack:files/intro.md"), Err(CoreError::Cancelled)));
    }
}
