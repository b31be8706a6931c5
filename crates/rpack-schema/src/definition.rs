//! A pack's own `rpack.yaml` definition, declaring the inputs it accepts
//! and the entry script it runs (`spec.md` §3, §6.1).
//!
//! Grounded on `apl-schema::types`'s `Artifact` validation pattern: parse
//! into a plain struct, then run a second, explicit validation pass that
//! checks cross-field invariants the type system can't express (no
//! duplicate names, patterns on nested identifiers).

use crate::error::DefinitionError;
use crate::ident::{InputName, PackName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

const SCHEMA_VERSION: &str = "v1";
const DEFINITION_FILE_NAME: &str = "rpack.yaml";
const SCRIPT_FILE_NAME: &str = "script.lua";

/// The declared shape of a single named input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    File,
    Dir,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::File => "file",
            InputKind::Dir => "dir",
        }
    }
}

/// One entry in a pack's declared `inputs:` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDecl {
    pub name: InputName,
    #[serde(rename = "type")]
    pub kind: InputKind,
}

/// The parsed and validated contents of a pack's `rpack.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackDefinition {
    #[serde(rename = "@schema_version")]
    pub schema_version: String,

    pub name: PackName,

    #[serde(default)]
    pub inputs: Vec<InputDecl>,
}

impl PackDefinition {
    /// Load and validate `rpack.yaml` from a pack's source directory,
    /// additionally checking that a sibling `script.lua` exists.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] if either file is missing, the
    /// definition cannot be read or parsed (including an invalid pack or
    /// input name, rejected by `PackName`/`InputName`'s own `Deserialize`),
    /// its schema version is unsupported, or it declares a duplicate input
    /// name.
    pub fn load_from_source_dir(source_dir: &Path) -> Result<Self, DefinitionError> {
        let def_path = source_dir.join(DEFINITION_FILE_NAME);
        let script_path = source_dir.join(SCRIPT_FILE_NAME);

        if !def_path.is_file() {
            return Err(DefinitionError::MissingDefinition(
                def_path.display().to_string(),
            ));
        }
        if !script_path.is_file() {
            return Err(DefinitionError::MissingScript(
                script_path.display().to_string(),
            ));
        }

        let content = std::fs::read_to_string(&def_path).map_err(|source| DefinitionError::Read {
            path: def_path.display().to_string(),
            source,
        })?;

        let definition: PackDefinition =
            serde_yaml::from_str(&content).map_err(|source| DefinitionError::Parse {
                path: def_path.display().to_string(),
                source,
            })?;

        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(DefinitionError::UnsupportedVersion(
                self.schema_version.clone(),
            ));
        }

        let mut seen = BTreeSet::new();
        for decl in &self.inputs {
            if !seen.insert(decl.name.as_str()) {
                return Err(DefinitionError::DuplicateInput(decl.name.to_string()));
            }
        }

        Ok(())
    }

    /// Look up a declared input by name.
    pub fn input(&self, name: &str) -> Option<&InputDecl> {
        self.inputs.iter().find(|decl| decl.name.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pack(dir: &std::path::Path, def_body: &str, with_script: bool) {
        std::fs::write(dir.join(DEFINITION_FILE_NAME), def_body).unwrap();
        if with_script {
            std::fs::write(dir.join(SCRIPT_FILE_NAME), "-- noop").unwrap();
        }
    }

    #[test]
    fn loads_definition_with_inputs() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(
            dir.path(),
            "\"@schema_version\": v1\nname: demo\ninputs:\n  - name: users.yaml\n    type: file\n  - name: assets\n    type: dir\n",
            true,
        );

        let def = PackDefinition::load_from_source_dir(dir.path()).unwrap();
        assert_eq!(def.name.as_str(), "demo");
        assert_eq!(def.inputs.len(), 2);
        assert_eq!(def.input("users.yaml").unwrap().kind, InputKind::File);
        assert_eq!(def.input("assets").unwrap().kind, InputKind::Dir);
        assert!(def.input("missing").is_none());
    }

    #[test]
    fn missing_script_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), "\"@schema_version\": v1\nname: demo\ninputs: []\n", false);
        assert!(matches!(
            PackDefinition::load_from_source_dir(dir.path()),
            Err(DefinitionError::MissingScript(_))
        ));
    }

    #[test]
    fn missing_definition_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SCRIPT_FILE_NAME), "-- noop").unwrap();
        assert!(matches!(
            PackDefinition::load_from_source_dir(dir.path()),
            Err(DefinitionError::MissingDefinition(_))
        ));
    }

    #[test]
    fn rejects_duplicate_input_names() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(
            dir.path(),
            "\"@schema_version\": v1\nname: demo\ninputs:\n  - name: a\n    type: file\n  - name: a\n    type: dir\n",
            true,
        );
        assert!(matches!(
            PackDefinition::load_from_source_dir(dir.path()),
            Err(DefinitionError::DuplicateInput(_))
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), "\"@schema_version\": v2\nname: demo\ninputs: []\n", true);
        assert!(matches!(
            PackDefinition::load_from_source_dir(dir.path()),
            Err(DefinitionError::UnsupportedVersion(_))
        ));
    }
}
