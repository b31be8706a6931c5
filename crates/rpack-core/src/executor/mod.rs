//! The Executor: load config and lockfile, stage the pack source, run the
//! script against a freshly prepared staging tree, then atomically
//! reconcile the staging tree with the target directory and lockfile
//! (`spec.md` §4.6).
//!
//! Grounded on `apl-cli::cmd::shell`'s load -> sync-check -> resolve ->
//! mount -> run pipeline, the teacher's closest analogue to this linear
//! state machine. Each step below is annotated with the spec step it
//! implements; `tracing` events mark every state transition in
//! `Loaded -> Staged -> Resolved -> Validated -> Executed -> Purity-OK ->
//! Gated -> Committed | Aborted | Dry-Run-Completed` so a
//! `RUST_LOG=rpack_core=debug` run narrates the pipeline.

pub mod commit;

use crate::cancel::CancelToken;
use crate::error::{CoreError, IntegrityError};
use crate::fetch::Fetcher;
use crate::fs::Fs;
use crate::hooks::{AccessControlHook, Hook, PurityHook};
use crate::inputs::resolve_inputs;
use crate::paths::RunLayout;
use crate::resolver::ResolverSet;
use crate::schema_check::ValuesSchema;
use crate::script::ScriptHost;
use rpack_schema::definition::PackDefinition;
use rpack_schema::{Config, Lockfile};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SCRIPT_FILE_NAME: &str = "script.lua";
const SCHEMA_FILE_NAME: &str = "schema.cue";

/// Read a pack's optional `schema.cue` from its source directory
/// (`spec.md` §4.6 step 4, §6.1). Returns `None` if the file is absent;
/// any other I/O failure is surfaced as [`CoreError`].
fn read_schema_cue(source_path: &Path) -> Result<Option<String>, CoreError> {
    let schema_path = source_path.join(SCHEMA_FILE_NAME);
    match std::fs::read_to_string(&schema_path) {
        Ok(source) => Ok(Some(source)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// The result of a successful `run` (live or dry-run).
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Paths newly present in the lockfile, relative to `exec_path`.
    pub added: Vec<String>,
    /// Paths dropped from the lockfile (and removed from disk unless
    /// `dry_run`), relative to `exec_path`.
    pub removed: Vec<String>,
    /// Whether this report describes a dry run: the staging tree is the
    /// observable result and neither `exec_path` nor the lockfile changed.
    pub dry_run: bool,
}

/// The result of a successful `check`: lockfile integrity holds.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Lockfile paths present on disk, confirmed unmodified.
    pub unchanged: Vec<String>,
}

/// Loads a pack run's configuration, stages its source and scratch trees,
/// executes its script against the mediated FS, and commits the result.
///
/// One `Executor` corresponds to one `{config file, exec_path}` pair; it
/// owns no state across calls to [`Self::run`]/[`Self::check`] beyond what
/// was passed to [`Self::new`].
pub struct Executor {
    config_path: PathBuf,
    exec_path: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    schema: Arc<dyn ValuesSchema>,
}

impl Executor {
    /// Build an executor for `config_path`, rooted at `exec_path` (the
    /// caller-supplied `--working-dir`, defaulting to the config's parent
    /// directory — that default is the CLI's responsibility).
    pub fn new(config_path: impl Into<PathBuf>, exec_path: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>, schema: Arc<dyn ValuesSchema>) -> Self {
        Self {
            config_path: config_path.into(),
            exec_path: exec_path.into(),
            fetcher,
            schema,
        }
    }

    /// Run the full load -> stage -> resolve -> validate -> execute ->
    /// purity -> gate -> commit pipeline (`spec.md` §4.6 steps 1-16).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] at the first failing step; every step before
    /// materialization (step 14) leaves `exec_path` untouched.
    pub async fn run(&self, force: bool, dry_run: bool, cancel: CancelToken) -> Result<RunReport, CoreError> {
        // --- 1. Load -------------------------------------------------
        let config = Config::load(&self.config_path)?;
        let lock_path = Config::lockfile_path_for(&self.config_path);
        let old_lockfile = Lockfile::load(&lock_path)?;
        tracing::info!(config = %self.config_path.display(), "Loaded");

        // --- 2. Stage --------------------------------------------------
        let layout = RunLayout::derive(&self.exec_path, &self.config_path, &config.source);
        layout.prepare()?;
        cancel.check()?;
        self.fetcher.fetch(&config.source, &layout.source_path, &cancel).await?;
        tracing::info!(source = %config.source, run_path = %layout.run_path.display(), "Staged");

        // --- 3/4. Resolve inputs + definition load & validation --------
        let definition = PackDefinition::load_from_source_dir(&layout.source_path)?;
        let schema_source = read_schema_cue(&layout.source_path)?;
        let values = config.config.values.clone().unwrap_or(Value::Null);
        self.schema
            .validate(&values, schema_source.as_deref())
            .map_err(CoreError::Schema)?;
        let resolved_inputs = resolve_inputs(&self.exec_path, &config.config.inputs, &definition)?;
        tracing::info!(pack = %definition.name, inputs = resolved_inputs.len(), "Resolved");
        tracing::info!("Validated");

        // --- 5. Script execution ----------------------------------------
        cancel.check()?;
        let resolvers = ResolverSet::new(
            layout.source_path.clone(),
            layout.temp_path.clone(),
            layout.run_path.clone(),
            resolved_inputs,
        );
        let purity = Arc::new(PurityHook::new());
        let hooks: Vec<Box<dyn Hook>> = vec![Box::new(AccessControlHook), Box::new(Arc::clone(&purity))];
        let input_names = config.config.inputs.keys().cloned().collect();
        let fs = Arc::new(Fs::new(resolvers, hooks, cancel.clone()));

        let script_path = layout.source_path.join(SCRIPT_FILE_NAME);
        let script_source = std::fs::read_to_string(&script_path)?;
        let host = ScriptHost::new(Arc::clone(&fs), input_names, values);
        host.run(SCRIPT_FILE_NAME, &script_source)?;
        tracing::info!("Executed");

        // --- 6. Purity gate ----------------------------------------------
        let conflicts = purity.conflict_check();
        if !conflicts.is_empty() {
            return Err(CoreError::Purity(conflicts));
        }
        tracing::info!("Purity-OK");

        // --- 7. Derive write set ------------------------------------------
        let write_set = fs.recorder().target_write_set();

        // --- 8/10. Checksum + new lockfile --------------------------------
        let checksummed = commit::checksum_write_set(&layout.run_path, &write_set)?;
        let new_lockfile = Lockfile::from_files(checksummed);

        // --- 9. Integrity gate (old lockfile vs exec_path) ------------------
        let (modified, removed_from_disk) = commit::modified_and_removed(&old_lockfile, &self.exec_path);
        if !modified.is_empty() {
            if !force {
                return Err(IntegrityError::Modified { paths: modified }.into());
            }
            tracing::warn!(paths = ?modified, "modified since last run, overwriting due to --force");
        }
        if !removed_from_disk.is_empty() {
            tracing::warn!(paths = ?removed_from_disk, "lockfile entries missing on disk");
        }

        // --- 11. Change diff --------------------------------------------
        let (added, removed) = commit::diff(&old_lockfile, &new_lockfile);

        // --- 12. Overwrite gate --------------------------------------------
        let collisions = commit::existing_paths(&added, &self.exec_path);
        if !collisions.is_empty() && !force {
            return Err(IntegrityError::WouldOverwrite { paths: collisions }.into());
        }
        tracing::info!(added = added.len(), removed = removed.len(), "Gated");

        // --- 13. Dry-run branch ----------------------------------------
        if dry_run {
            tracing::info!("Dry-Run-Completed");
            return Ok(RunReport { added, removed, dry_run: true });
        }

        cancel.check()?;
        // --- 14. Materialize writes --------------------------------------
        commit::materialize(&layout.run_path, &self.exec_path, &write_set)?;

        // --- 15. Remove obsolete ------------------------------------------
        commit::remove_obsolete(&removed, &self.exec_path)?;

        // --- 16. Persist lockfile ------------------------------------------
        new_lockfile.save(&lock_path)?;
        tracing::info!("Committed");

        Ok(RunReport { added, removed, dry_run: false })
    }

    /// The subset of [`Self::run`] that validates lockfile integrity without
    /// executing anything: load config + lockfile, then the integrity gate
    /// with `force = false` (`spec.md` §4.6 "`check` is the subset 1-2 +
    /// integrity gate").
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Integrity`] if any lockfile entry is modified or
    /// removed on disk; propagates config/lockfile/fetch errors from load
    /// and staging otherwise.
    pub async fn check(&self, cancel: CancelToken) -> Result<CheckReport, CoreError> {
        let config = Config::load(&self.config_path)?;
        let lock_path = Config::lockfile_path_for(&self.config_path);
        let old_lockfile = Lockfile::load(&lock_path)?;

        let layout = RunLayout::derive(&self.exec_path, &self.config_path, &config.source);
        layout.prepare()?;
        cancel.check()?;
        self.fetcher.fetch(&config.source, &layout.source_path, &cancel).await?;

        let (modified, removed) = commit::modified_and_removed(&old_lockfile, &self.exec_path);
        if !modified.is_empty() {
            return Err(IntegrityError::Modified { paths: modified }.into());
        }
        if !removed.is_empty() {
            return Err(IntegrityError::Removed { paths: removed }.into());
        }

        Ok(CheckReport {
            unchanged: old_lockfile.files.keys().cloned().collect(),
        })
    }

    pub fn exec_path(&self) -> &Path {
        &self.exec_path
    }
}
