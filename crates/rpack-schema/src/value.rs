//! Data-only value tree shared across `values()`, `from_yaml`/`to_yaml`, and
//! `from_json`/`to_json` (`spec.md` §6.2).
//!
//! `serde_json::Value` is the canonical in-memory representation. Both
//! `serde_yaml::Value` and `serde_json::Value` implement `serde::Serialize`,
//! so bridging between them is a plain serde round trip through
//! `serde_json::to_value`/`serde_json::from_value` — no bespoke converter or
//! extra crate needed.

use serde_json::Value;

/// Parse a YAML document into the canonical value tree.
///
/// # Errors
///
/// Returns an error if `src` is not valid YAML, or if the parsed document
/// cannot be represented as a JSON-compatible value (e.g. a YAML mapping
/// with non-string keys).
pub fn from_yaml_str(src: &str) -> Result<Value, String> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(src).map_err(|e| e.to_string())?;
    yaml_to_json(yaml)
}

/// Serialize the canonical value tree as a YAML document.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized as YAML.
pub fn to_yaml_str(value: &Value) -> Result<String, String> {
    serde_yaml::to_string(value).map_err(|e| e.to_string())
}

/// Parse a JSON document into the canonical value tree.
///
/// # Errors
///
/// Returns an error if `src` is not valid JSON.
pub fn from_json_str(src: &str) -> Result<Value, String> {
    serde_json::from_str(src).map_err(|e| e.to_string())
}

/// Serialize the canonical value tree as a JSON document.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized as JSON (practically
/// never, for a tree already built from JSON-compatible data).
pub fn to_json_str(value: &Value) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

/// Bridge a `serde_yaml::Value` into the canonical `serde_json::Value` tree.
fn yaml_to_json(yaml: serde_yaml::Value) -> Result<Value, String> {
    serde_json::to_value(yaml).map_err(|e| e.to_string())
}
