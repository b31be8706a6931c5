//! The pack-schema validation boundary: structural validation of
//! `config.values` against a pack's optional `schema.cue` (`spec.md` §1
//! "out of scope... YAML/JSON/CUE schema parsing as libraries", §4.6 step 4
//! "validate user values against the pack's schema (no-op if absent)").
//!
//! Grounded on [`crate::fetch::Fetcher`]'s shape: the concrete schema
//! language is a collaborator this crate only calls through a trait, the
//! same way the bundle transport is. No-op is the only implementation
//! shipped here since CUE parsing itself is explicitly out of scope.

use serde_json::Value;

/// Validates a run's `values` tree against a pack's declared schema.
/// Implementations own the schema language (CUE, JSON Schema, ...);
/// `rpack-core` only depends on this trait. `schema_source` is the raw
/// contents of the pack's `schema.cue`, or `None` when the pack ships no
/// schema file at all — callers pass whatever the Executor read from
/// `source_path/schema.cue`, this trait never touches a filesystem itself.
pub trait ValuesSchema: Send + Sync {
    /// Check `values` against `schema_source`, if any.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason string on the first violation found.
    fn validate(&self, values: &Value, schema_source: Option<&str>) -> Result<(), String>;
}

/// The schema this crate ships: always passes, regardless of whether a
/// `schema.cue` was found (CUE parsing itself is explicitly out of scope,
/// `spec.md` §1).
#[derive(Debug, Default)]
pub struct NoSchema;

impl ValuesSchema for NoSchema {
    fn validate(&self, _values: &Value, _schema_source: Option<&str>) -> Result<(), String> {
        Ok(())
    }
}
