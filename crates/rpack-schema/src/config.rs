//! `NAME.rpack.yaml` config parsing (`spec.md` §3, §6.1).
//!
//! Grounded on `apl-core::manifest::Manifest::load`: a suffix/shape-checked
//! load of a small YAML/TOML document into a plain struct, with no
//! surrounding ceremony.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const CONFIG_SUFFIX: &str = ".rpack.yaml";
const LOCK_SUFFIX: &str = ".rpack.lock.yaml";
const SCHEMA_VERSION: &str = "v1";

/// Parsed `NAME.rpack.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "@schema_version")]
    pub schema_version: String,

    /// Bundle fetcher URL (scheme delegated to the out-of-scope fetcher).
    pub source: String,

    #[serde(default)]
    pub config: ConfigBody,
}

/// The nested `config:` object holding user values and input mappings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigBody {
    /// Opaque user-supplied value tree, validated against the pack's
    /// optional schema by an external collaborator (`spec.md` §10.7 /
    /// `ValuesSchema` in `rpack-core`).
    #[serde(default)]
    pub values: Option<Value>,

    /// Map of input name to a user-relative, local path.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

impl Config {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the filename suffix is wrong, the file
    /// cannot be read or parsed, required fields are empty, the schema
    /// version is unsupported, or `config.inputs` contains no-op
    /// duplicates after case-sensitive comparison.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if !file_name.ends_with(CONFIG_SUFFIX) {
            return Err(ConfigError::BadSuffix(file_name.to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.schema_version.clone()));
        }
        if self.source.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "source" });
        }
        // BTreeMap keys are already unique by construction; this guards the
        // case where the same input name is supplied twice with differing
        // case, which YAML would otherwise silently collapse to "last wins".
        let mut seen = std::collections::BTreeSet::new();
        for name in self.config.inputs.keys() {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateInput(name.clone()));
            }
        }
        Ok(())
    }

    /// Derive the companion lockfile path by replacing the config suffix.
    pub fn lockfile_path_for(config_path: &Path) -> std::path::PathBuf {
        let file_name = config_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let stem = file_name
            .strip_suffix(CONFIG_SUFFIX)
            .unwrap_or(file_name);
        config_path.with_file_name(format!("{stem}{LOCK_SUFFIX}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "demo.rpack.yaml",
            "\"@schema_version\": v1\nsource: file:///tmp/pack\n",
        );
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.source, "file:///tmp/pack");
        assert!(cfg.config.inputs.is_empty());
        assert!(cfg.config.values.is_none());
    }

    #[test]
    fn empty_inputs_and_values_are_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "demo.rpack.yaml",
            "\"@schema_version\": v1\nsource: s\nconfig:\n  inputs: {}\n",
        );
        assert!(Config::load(&path).is_ok());
    }

    #[test]
    fn rejects_bad_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "demo.yaml", "\"@schema_version\": v1\nsource: s\n");
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::BadSuffix(_))
        ));
    }

    #[test]
    fn rejects_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "demo.rpack.yaml",
            "\"@schema_version\": v1\nsource: \"\"\n",
        );
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::EmptyField { field: "source" })
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "demo.rpack.yaml",
            "\"@schema_version\": v2\nsource: s\n",
        );
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn lockfile_path_replaces_suffix() {
        let cfg_path = Path::new("/proj/demo.rpack.yaml");
        let lock_path = Config::lockfile_path_for(cfg_path);
        assert_eq!(lock_path, Path::new("/proj/demo.rpack.lock.yaml"));
    }
}
