//! Commit-phase helpers: checksum the staged write set, diff it against the
//! prior lockfile, and materialize it into `exec_path` (`spec.md` §4.6 steps
//! 8–15).
//!
//! Grounded on the teacher's `apl-schema::merkle`/lockfile reconciliation
//! idiom for the added/removed diff, and on `apl-core::sysroot`'s
//! rename-into-place staging pattern for materializing a build into a live
//! directory.

use crate::error::CommitError;
use rpack_schema::hash::Sha256Hex;
use rpack_schema::Lockfile;
use std::path::Path;

/// Compute the checksum of every path in `write_set` as staged under
/// `run_path`.
///
/// # Errors
///
/// Returns [`CommitError::Checksum`] if a staged file cannot be read.
pub fn checksum_write_set(
    run_path: &Path,
    write_set: &[String],
) -> Result<Vec<(String, Sha256Hex)>, CommitError> {
    write_set
        .iter()
        .map(|path| {
            let sha = Sha256Hex::compute_file(&run_path.join(path)).map_err(|source| CommitError::Checksum {
                path: path.clone(),
                source,
            })?;
            Ok((path.clone(), sha))
        })
        .collect()
}

/// Entries from `old` whose content on disk at `exec_path` has changed
/// (`modified`) or no longer exists (`removed`), in lockfile order
/// (`spec.md` §4.6 step 9).
pub fn modified_and_removed(old: &Lockfile, exec_path: &Path) -> (Vec<String>, Vec<String>) {
    let mut modified = Vec::new();
    let mut removed = Vec::new();

    for (path, recorded_sha) in &old.files {
        let abs = exec_path.join(path);
        match Sha256Hex::compute_file(abs.as_path()) {
            Ok(current) if &current == recorded_sha => {}
            Ok(_) => modified.push(path.clone()),
            Err(_) => removed.push(path.clone()),
        }
    }

    (modified, removed)
}

/// Paths present in `new` but not `old` (`added`), and present in `old` but
/// not `new` (`removed`) — the lockfile-to-lockfile diff driving commit and
/// cleanup (`spec.md` §4.6 step 11).
pub fn diff(old: &Lockfile, new: &Lockfile) -> (Vec<String>, Vec<String>) {
    let added = new.files.keys().filter(|p| !old.files.contains_key(*p)).cloned().collect();
    let removed = old.files.keys().filter(|p| !new.files.contains_key(*p)).cloned().collect();

    (added, removed)
}

/// Reject any `added` path that already exists under `exec_path`, unless
/// `force` (`spec.md` §4.6 step 12).
///
/// # Errors
///
/// Returns [`CommitError`] (wrapped as [`crate::error::IntegrityError::WouldOverwrite`]
/// by the caller) is not raised here directly; this function returns the
/// conflicting paths so the executor can build that error with full
/// context.
pub fn existing_paths(added: &[String], exec_path: &Path) -> Vec<String> {
    added.iter().filter(|p| exec_path.join(p).exists()).cloned().collect()
}

/// Move every staged file from `run_path` into `exec_path`, falling back to
/// copy-then-remove when a rename fails (e.g. the cache lives on a
/// different filesystem than `exec_path`).
///
/// # Errors
///
/// Returns [`CommitError::Mkdir`] or [`CommitError::Materialize`] if a
/// parent directory cannot be created or a file cannot be placed.
pub fn materialize(run_path: &Path, exec_path: &Path, write_set: &[String]) -> Result<(), CommitError> {
    for path in write_set {
        let src = run_path.join(path);
        let dest = exec_path.join(path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CommitError::Mkdir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        if std::fs::rename(&src, &dest).is_err() {
            std::fs::copy(&src, &dest).map_err(|source| CommitError::Materialize {
                path: path.clone(),
                source,
            })?;
            std::fs::remove_file(&src).map_err(|source| CommitError::Materialize {
                path: path.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Remove every path dropped from the new lockfile from `exec_path`.
/// Missing files are not an error: a prior partial commit or manual
/// cleanup may have already removed them.
///
/// # Errors
///
/// Returns [`CommitError::Remove`] if a present file cannot be removed.
pub fn remove_obsolete(removed: &[String], exec_path: &Path) -> Result<(), CommitError> {
    for path in removed {
        let abs = exec_path.join(path);
        match std::fs::remove_file(&abs) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CommitError::Remove {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
    Ok(())
}
