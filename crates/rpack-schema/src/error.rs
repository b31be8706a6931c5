//! Parsing/validation-level error taxonomy (`spec.md` §7, categories 1–2, 4–6).
//!
//! Run-time errors that require a live `Fs`/`Executor` (access-control,
//! purity, script, integrity, commit) live in `rpack-core::error` instead —
//! see `DESIGN.md`. This split mirrors the teacher's layering: low-level
//! parse errors (`apl-schema`'s `ArtifactError`) stay close to the data,
//! while the aggregate operational error (`apl-cli`'s `InstallError`) wraps
//! them with `#[from]`.

use thiserror::Error;

/// Errors loading/validating a `NAME.rpack.yaml` config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file must have a '.rpack.yaml' suffix, got '{0}'")]
    BadSuffix(String),

    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config '{field}' must be non-empty")]
    EmptyField { field: &'static str },

    #[error("unsupported config schema_version '{0}', expected 'v1'")]
    UnsupportedVersion(String),

    #[error("duplicate input name '{0}' in config")]
    DuplicateInput(String),
}

/// Errors loading/saving a `NAME.rpack.lock.yaml` lockfile.
#[derive(Error, Debug)]
pub enum LockfileError {
    #[error("failed to read lockfile '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lockfile '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize lockfile: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to write lockfile '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported lockfile schema_version '{0}', expected 'v1'")]
    UnsupportedVersion(String),

    #[error("invalid checksum for lockfile entry '{path}': {reason}")]
    BadChecksum { path: String, reason: String },
}

/// Errors loading/validating a pack's `rpack.yaml` definition.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("pack source '{0}' is missing rpack.yaml")]
    MissingDefinition(String),

    #[error("pack source '{0}' is missing script.lua")]
    MissingScript(String),

    #[error("failed to read definition '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse definition '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported definition schema_version '{0}', expected 'v1'")]
    UnsupportedVersion(String),

    #[error("duplicate declared input '{0}'")]
    DuplicateInput(String),
}

/// Errors resolving user-supplied `config.inputs` mappings to concrete paths.
#[derive(Error, Debug)]
pub enum InputResolutionError {
    #[error("input '{name}' path '{path}' must not be absolute")]
    AbsolutePath { name: String, path: String },

    #[error("input '{name}' path '{path}' escapes its base directory")]
    EscapesBase { name: String, path: String },

    #[error("input '{name}' path '{path}' does not exist")]
    NotFound { name: String, path: String },

    #[error("duplicate input name '{0}' in config")]
    DuplicateName(String),

    #[error("input '{name}' not declared by the pack definition")]
    Undeclared { name: String },

    #[error("input '{name}' kind mismatch: declared {declared}, found {observed}")]
    KindMismatch {
        name: String,
        declared: &'static str,
        observed: &'static str,
    },

    #[error("duplicate declared input '{0}' in pack definition")]
    DuplicateDeclaration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors resolving or validating a friendly path against resolver rules.
///
/// Shared by the resolver set (`rpack-core::resolver`) and input resolution:
/// §8 requires both "unknown prefix" and "escapes base" to fail as
/// `PathError` regardless of which operation triggered them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("unknown path prefix in '{0}'")]
    UnknownPrefix(String),

    #[error("path '{0}' must not be absolute")]
    Absolute(String),

    #[error("path '{friendly}' escapes its base after resolving '..'")]
    Escapes { friendly: String },

    #[error("path '{friendly}' has extra segment '{extra}' but the mapped input is a file, not a directory")]
    ExtraSegmentOnFileInput { friendly: String, extra: String },
}
