//! Access-control and purity hooks: middleware intercepting every handle
//! operation before delegation (`spec.md` §4.2, §4.3, §9 "Hooks as
//! middleware").
//!
//! Grounded on the teacher's `reporter.rs` trait-over-`Arc` shape, here
//! turned into a short-circuiting, order-preserving chain instead of a
//! fan-out notification sink.

use crate::resolver::ResolverId;
use rpack_schema::error::PathError;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// The kind of FS operation a hook is asked to approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    Stat,
    Readdir,
}

/// Errors a hook can raise to abort the in-flight FS call.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HookError {
    #[error("access denied: cannot {kind:?} '{friendly_path}'; use {hint} instead")]
    AccessDenied {
        kind: AccessKind,
        friendly_path: String,
        hint: &'static str,
    },

    #[error(transparent)]
    Path(#[from] PathError),
}

/// One middleware stage in the hook chain. Access-control is stateless;
/// purity is stateful (`spec.md` §9). Both share this capability set.
pub trait Hook: Send + Sync {
    fn on_read(&self, _resolver_id: ResolverId, _friendly_path: &str, _indirect_target_path: &str) -> Result<(), HookError> {
        Ok(())
    }
    fn on_write(&self, _resolver_id: ResolverId, _friendly_path: &str, _indirect_target_path: &str) -> Result<(), HookError> {
        Ok(())
    }
    fn on_stat(&self, _resolver_id: ResolverId, _friendly_path: &str, _indirect_target_path: &str) -> Result<(), HookError> {
        Ok(())
    }
    fn on_readdir(&self, _resolver_id: ResolverId, _friendly_path: &str, _indirect_target_path: &str) -> Result<(), HookError> {
        Ok(())
    }
}

impl<T: Hook + ?Sized> Hook for std::sync::Arc<T> {
    fn on_read(&self, resolver_id: ResolverId, friendly_path: &str, indirect_target_path: &str) -> Result<(), HookError> {
        (**self).on_read(resolver_id, friendly_path, indirect_target_path)
    }
    fn on_write(&self, resolver_id: ResolverId, friendly_path: &str, indirect_target_path: &str) -> Result<(), HookError> {
        (**self).on_write(resolver_id, friendly_path, indirect_target_path)
    }
    fn on_stat(&self, resolver_id: ResolverId, friendly_path: &str, indirect_target_path: &str) -> Result<(), HookError> {
        (**self).on_stat(resolver_id, friendly_path, indirect_target_path)
    }
    fn on_readdir(&self, resolver_id: ResolverId, friendly_path: &str, indirect_target_path: &str) -> Result<(), HookError> {
        (**self).on_readdir(resolver_id, friendly_path, indirect_target_path)
    }
}

/// Run a chain of hooks in order for one access kind, short-circuiting on
/// the first failure (`spec.md` §4.5 step 2).
pub fn run_chain(
    hooks: &[Box<dyn Hook>],
    kind: AccessKind,
    resolver_id: ResolverId,
    friendly_path: &str,
    indirect_target_path: &str,
) -> Result<(), HookError> {
    for hook in hooks {
        let result = match kind {
            AccessKind::Read => hook.on_read(resolver_id, friendly_path, indirect_target_path),
            AccessKind::Write => hook.on_write(resolver_id, friendly_path, indirect_target_path),
            AccessKind::Stat => hook.on_stat(resolver_id, friendly_path, indirect_target_path),
            AccessKind::Readdir => hook.on_readdir(resolver_id, friendly_path, indirect_target_path),
        };
        result?;
    }
    Ok(())
}

/// Static location rules: the target directory is write-only from the
/// script's perspective, so prior-run state can never leak into the
/// current run's computation (`spec.md` §4.2).
pub struct AccessControlHook;

impl Hook for AccessControlHook {
    fn on_read(&self, resolver_id: ResolverId, friendly_path: &str, _: &str) -> Result<(), HookError> {
        deny_unless_readable(resolver_id, friendly_path, AccessKind::Read)
    }

    fn on_stat(&self, resolver_id: ResolverId, friendly_path: &str, _: &str) -> Result<(), HookError> {
        deny_unless_readable(resolver_id, friendly_path, AccessKind::Stat)
    }

    fn on_readdir(&self, resolver_id: ResolverId, friendly_path: &str, _: &str) -> Result<(), HookError> {
        deny_unless_readable(resolver_id, friendly_path, AccessKind::Readdir)
    }

    fn on_write(&self, resolver_id: ResolverId, friendly_path: &str, _: &str) -> Result<(), HookError> {
        match resolver_id {
            ResolverId::Temp | ResolverId::Target => Ok(()),
            ResolverId::Rpack => Err(HookError::AccessDenied {
                kind: AccessKind::Write,
                friendly_path: friendly_path.to_string(),
                hint: "temp:",
            }),
            ResolverId::Map => Err(HookError::AccessDenied {
                kind: AccessKind::Write,
                friendly_path: friendly_path.to_string(),
                hint: "temp: or the target path",
            }),
        }
    }
}

fn deny_unless_readable(
    resolver_id: ResolverId,
    friendly_path: &str,
    kind: AccessKind,
) -> Result<(), HookError> {
    match resolver_id {
        ResolverId::Rpack | ResolverId::Temp | ResolverId::Map => Ok(()),
        ResolverId::Target => Err(HookError::AccessDenied {
            kind,
            friendly_path: friendly_path.to_string(),
            hint: "map: or rpack:",
        }),
    }
}

/// Tracks read/stat/readdir/write operations by `indirect_target_path` and
/// flags a conflict if any observed path overlaps a produced one
/// (`spec.md` §4.3).
#[derive(Default)]
pub struct PurityHook {
    state: Mutex<PurityState>,
}

#[derive(Default)]
struct PurityState {
    reads: BTreeSet<String>,
    stats: BTreeSet<String>,
    readdirs: BTreeSet<String>,
    writes: BTreeSet<String>,
}

/// A single purity violation, reported by [`PurityHook::conflict_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurityConflict {
    ReadWriteOverlap { path: String },
    StatWriteOverlap { path: String },
    ReaddirWritePrefix { dir: String, write: String },
}

impl PurityHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the end-of-script conflict check (`spec.md` §4.3).
    ///
    /// Returns every conflict found, not just the first, so the executor
    /// can report the full set.
    pub fn conflict_check(&self) -> Vec<PurityConflict> {
        let state = self.state.lock().expect("purity hook mutex poisoned");
        let mut conflicts = Vec::new();

        for path in state.reads.intersection(&state.writes) {
            conflicts.push(PurityConflict::ReadWriteOverlap { path: path.clone() });
        }
        for path in state.stats.intersection(&state.writes) {
            conflicts.push(PurityConflict::StatWriteOverlap { path: path.clone() });
        }
        for dir in &state.readdirs {
            let prefix = format!("{dir}/");
            for write in &state.writes {
                if write.starts_with(&prefix) {
                    conflicts.push(PurityConflict::ReaddirWritePrefix {
                        dir: dir.clone(),
                        write: write.clone(),
                    });
                }
            }
        }
        conflicts
    }
}

impl Hook for PurityHook {
    fn on_read(&self, resolver_id: ResolverId, _: &str, indirect_target_path: &str) -> Result<(), HookError> {
        if resolver_id == ResolverId::Map && !indirect_target_path.is_empty() {
            self.state.lock().unwrap().reads.insert(indirect_target_path.to_string());
        }
        Ok(())
    }

    fn on_stat(&self, resolver_id: ResolverId, _: &str, indirect_target_path: &str) -> Result<(), HookError> {
        if resolver_id == ResolverId::Map && !indirect_target_path.is_empty() {
            self.state.lock().unwrap().stats.insert(indirect_target_path.to_string());
        }
        Ok(())
    }

    fn on_readdir(&self, resolver_id: ResolverId, _: &str, indirect_target_path: &str) -> Result<(), HookError> {
        if resolver_id == ResolverId::Map {
            self.state.lock().unwrap().readdirs.insert(indirect_target_path.to_string());
        }
        Ok(())
    }

    fn on_write(&self, resolver_id: ResolverId, _: &str, indirect_target_path: &str) -> Result<(), HookError> {
        if resolver_id == ResolverId::Target {
            self.state.lock().unwrap().writes.insert(indirect_target_path.to_string());
        }
        Ok(())
    }
}
