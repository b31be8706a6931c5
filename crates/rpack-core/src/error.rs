//! Run-time error taxonomy: everything that needs a live `Fs`/`Executor` to
//! occur (`spec.md` §7, categories 3, 7–11). Parse/validation-level errors
//! (categories 1–2, 4–6) live in `rpack_schema::error` and are folded in
//! here via `#[from]`, mirroring the teacher's `apl-cli::ops::error`
//! aggregate wrapping `apl-schema`'s lower-level errors.

use crate::fetch::FetchError;
use crate::hooks::{HookError, PurityConflict};
use rpack_schema::error::{
    ConfigError, DefinitionError, InputResolutionError, LockfileError, PathError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("script error in '{path}': {message}")]
    Runtime { path: String, message: String },
}

#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("modified since last run (use --force to overwrite): {paths:?}")]
    Modified { paths: Vec<String> },

    #[error("removed since last run: {paths:?}")]
    Removed { paths: Vec<String> },

    #[error("would overwrite existing file(s) without --force: {paths:?}")]
    WouldOverwrite { paths: Vec<String> },
}

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("failed to create directory '{path}': {source}")]
    Mkdir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to checksum staged file '{path}': {source}")]
    Checksum {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to materialize '{path}': {source}")]
    Materialize {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove obsolete file '{path}': {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The aggregate error type returned by `Executor::run`/`Executor::check`.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lockfile(#[from] LockfileError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    InputResolution(#[from] InputResolutionError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("purity violation(s): {0:?}")]
    Purity(Vec<PurityConflict>),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error("values failed schema validation: {0}")]
    Schema(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("run was cancelled")]
    Cancelled,
}

impl From<HookError> for CoreError {
    fn from(err: HookError) -> Self {
        match err {
            HookError::AccessDenied { .. } => CoreError::AccessDenied(err.to_string()),
            HookError::Path(path_err) => CoreError::Path(path_err),
        }
    }
}
