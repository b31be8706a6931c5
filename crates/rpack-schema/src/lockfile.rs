//! `NAME.rpack.lock.yaml` lockfile parsing and persistence (`spec.md` §4.6
//! steps 9 and 16, §6.1).
//!
//! Grounded on `apl-core::manifest::Lockfile::load`/`save`: missing lockfile
//! is treated as an empty one rather than an error, and saving goes through
//! a temp-file-then-rename to avoid leaving a half-written lockfile behind
//! if the process is interrupted mid-write.

use crate::error::LockfileError;
use crate::hash::Sha256Hex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const SCHEMA_VERSION: &str = "v1";

/// A single tracked file: its path relative to the config directory and the
/// SHA-256 of its contents at the close of the run that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub sha: Sha256Hex,
}

/// The full set of files this pack owns at `target:`.
///
/// On the wire this is `files: [{path, sha}]` per `spec.md` §6.1; in memory
/// it is kept as a `path -> sha` map so diffing two lockfiles (`spec.md`
/// §4.6 step 11) is a plain `BTreeMap` comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    pub schema_version: String,
    pub files: BTreeMap<String, Sha256Hex>,
}

#[derive(Serialize, Deserialize)]
struct LockfileWire {
    #[serde(rename = "@schema_version")]
    schema_version: String,
    #[serde(default)]
    files: Vec<FileEntry>,
}

impl Lockfile {
    fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            files: BTreeMap::new(),
        }
    }

    /// Load a lockfile, treating a missing file as an empty lockfile.
    ///
    /// # Errors
    ///
    /// Returns [`LockfileError`] if the file exists but cannot be read or
    /// parsed, or declares an unsupported schema version.
    pub fn load(path: &Path) -> Result<Self, LockfileError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(LockfileError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        let wire: LockfileWire =
            serde_yaml::from_str(&content).map_err(|source| LockfileError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        if wire.schema_version != SCHEMA_VERSION {
            return Err(LockfileError::UnsupportedVersion(wire.schema_version));
        }

        Ok(Self {
            schema_version: wire.schema_version,
            files: wire
                .files
                .into_iter()
                .map(|entry| (entry.path, entry.sha))
                .collect(),
        })
    }

    /// Persist the lockfile atomically: write to a sibling temp file, then
    /// rename over the destination.
    ///
    /// # Errors
    ///
    /// Returns [`LockfileError`] if serialization or either filesystem step
    /// fails.
    pub fn save(&self, path: &Path) -> Result<(), LockfileError> {
        let wire = LockfileWire {
            schema_version: self.schema_version.clone(),
            files: self
                .files
                .iter()
                .map(|(path, sha)| FileEntry {
                    path: path.clone(),
                    sha: sha.clone(),
                })
                .collect(),
        };
        let body = serde_yaml::to_string(&wire)?;

        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, body).map_err(|source| LockfileError::Write {
            path: tmp_path.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp_path, path).map_err(|source| LockfileError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Build a new lockfile from a run's final write set.
    pub fn from_files(files: impl IntoIterator<Item = (String, Sha256Hex)>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            files: files.into_iter().collect(),
        }
    }
}
