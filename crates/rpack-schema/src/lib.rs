//! Wire types, identifiers, and validation for RPack packs, configs, and
//! lockfiles.
//!
//! This crate defines the data shared across `rpack-core` and `rpack-cli`:
//! the `NAME.rpack.yaml` config format, a pack's own `rpack.yaml`
//! definition, the `NAME.rpack.lock.yaml` lockfile, validated pack/input
//! identifiers, a SHA-256 digest newtype, a canonical JSON/YAML value
//! bridge, and the parsing/validation error taxonomy. Nothing in this
//! crate touches a filesystem beyond reading/writing these documents.

/// `NAME.rpack.yaml` config parsing.
pub mod config;
/// A pack's own `rpack.yaml` definition.
pub mod definition;
/// Parsing/validation-level error taxonomy.
pub mod error;
/// SHA-256 digest newtype.
pub mod hash;
/// Validated pack and input identifier newtypes.
pub mod ident;
/// `NAME.rpack.lock.yaml` lockfile parsing and persistence.
pub mod lockfile;
/// Canonical JSON/YAML value tree bridge.
pub mod value;

pub use config::{Config, ConfigBody};
pub use definition::{InputDecl, InputKind, PackDefinition};
pub use hash::Sha256Hex;
pub use ident::{InputName, PackName};
pub use lockfile::Lockfile;
