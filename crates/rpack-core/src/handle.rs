//! Handles: capability objects wrapping the IO operations for one resolved
//! path (`spec.md` §4.1 "Handle contract").
//!
//! Grounded on `diodeinc-pcb`'s `FileProvider` trait: a capability object
//! abstracting file IO behind a small trait so the mediated surface above it
//! never touches `std::fs` directly. The blanket `Arc<T>` impl mirrors both
//! `FileProvider` and the teacher's `Reporter` trait.

use crate::resolver::ResolverId;
use std::io;
use std::path::{Path, PathBuf};

/// The result of a `stat` call: existence and whether the path is a
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub exists: bool,
    pub is_dir: bool,
}

/// Children of a directory, split into files and subdirectories, as
/// friendly paths relative to the resolved directory's own friendly path.
#[derive(Debug, Clone, Default)]
pub struct DirListing {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
}

/// A capability object for one resolved friendly path.
///
/// Handles are ephemeral: created by exactly one resolver, never shared
/// across runs, and carry no back-pointer to the resolver that produced
/// them — only its [`ResolverId`] (`spec.md` §9 "Avoid cyclic references").
pub trait Handle: Send + Sync {
    /// Read the full contents of the file this handle points to.
    fn read(&self) -> io::Result<Vec<u8>>;

    /// Overwrite the file this handle points to, creating parent
    /// directories with default mode first.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Whether the path exists and, if so, whether it is a directory.
    fn stat(&self) -> io::Result<Stat>;

    /// List immediate children, split into files and directories. Returned
    /// entries are bare names (no path separators), to be composed by the
    /// caller into child friendly paths.
    fn read_dir(&self) -> io::Result<DirListing>;

    /// Which resolver produced this handle.
    fn resolver_id(&self) -> ResolverId;

    /// The prefixed name as the script wrote it.
    fn friendly_path(&self) -> &str;

    /// The path this handle's content would occupy in the final target
    /// directory, used for purity matching and commit routing. Only
    /// meaningful (non-empty) for target-resolver handles and for
    /// recording purposes on read-side resolvers.
    fn indirect_target_path(&self) -> &str;
}

impl<T: Handle + ?Sized> Handle for std::sync::Arc<T> {
    fn read(&self) -> io::Result<Vec<u8>> {
        (**self).read()
    }
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }
    fn stat(&self) -> io::Result<Stat> {
        (**self).stat()
    }
    fn read_dir(&self) -> io::Result<DirListing> {
        (**self).read_dir()
    }
    fn resolver_id(&self) -> ResolverId {
        (**self).resolver_id()
    }
    fn friendly_path(&self) -> &str {
        (**self).friendly_path()
    }
    fn indirect_target_path(&self) -> &str {
        (**self).indirect_target_path()
    }
}

/// A handle backed by a concrete path on the real filesystem. The only
/// handle variant shipped for the four built-in resolvers; an in-memory
/// variant is permitted for tests (`spec.md` §9 "Handle polymorphism") but
/// not needed here since `tempfile` staging directories already give tests
/// a real, disposable filesystem.
#[derive(Debug, Clone)]
pub struct FileHandle {
    resolver_id: ResolverId,
    friendly_path: String,
    abs_path: PathBuf,
    indirect_target_path: String,
}

impl FileHandle {
    pub fn new(
        resolver_id: ResolverId,
        friendly_path: impl Into<String>,
        abs_path: impl Into<PathBuf>,
        indirect_target_path: impl Into<String>,
    ) -> Self {
        Self {
            resolver_id,
            friendly_path: friendly_path.into(),
            abs_path: abs_path.into(),
            indirect_target_path: indirect_target_path.into(),
        }
    }

    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// Derive a child handle by appending one path component, composing
    /// `friendly_path` and `indirect_target_path` the way `spec.md` §4.1
    /// requires for `read_dir` results.
    fn child(&self, name: &str) -> Self {
        let sep = if self.friendly_path.ends_with('/') {
            ""
        } else {
            "/"
        };
        Self {
            resolver_id: self.resolver_id,
            friendly_path: format!("{}{sep}{name}", self.friendly_path),
            abs_path: self.abs_path.join(name),
            indirect_target_path: if self.indirect_target_path.is_empty() {
                name.to_string()
            } else {
                format!("{}/{name}", self.indirect_target_path)
            },
        }
    }
}

impl Handle for FileHandle {
    fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.abs_path)
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.abs_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.abs_path, bytes)
    }

    fn stat(&self) -> io::Result<Stat> {
        match std::fs::metadata(&self.abs_path) {
            Ok(meta) => Ok(Stat {
                exists: true,
                is_dir: meta.is_dir(),
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Stat {
                exists: false,
                is_dir: false,
            }),
            Err(err) => Err(err),
        }
    }

    fn read_dir(&self) -> io::Result<DirListing> {
        let mut listing = DirListing::default();
        for entry in std::fs::read_dir(&self.abs_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                listing.dirs.push(name);
            } else {
                listing.files.push(name);
            }
        }
        listing.files.sort();
        listing.dirs.sort();
        Ok(listing)
    }

    fn resolver_id(&self) -> ResolverId {
        self.resolver_id
    }

    fn friendly_path(&self) -> &str {
        &self.friendly_path
    }

    fn indirect_target_path(&self) -> &str {
        &self.indirect_target_path
    }
}

/// Expand a handle's directory listing into full child handles, as used by
/// `Fs::read_dir_recursive` to re-enter the mediated surface at every level.
pub fn child_handles(parent: &FileHandle, listing: &DirListing) -> (Vec<FileHandle>, Vec<FileHandle>) {
    let files = listing.files.iter().map(|name| parent.child(name)).collect();
    let dirs = listing.dirs.iter().map(|name| parent.child(name)).collect();
    (files, dirs)
}
