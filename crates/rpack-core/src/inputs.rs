//! Resolving a config's declared `inputs: {name -> user-path}` against the
//! pack definition's declared inputs (`spec.md` §4.6 step 3 and step 4's
//! cross-check).
//!
//! Grounded on `apl-cli::ops::flow`'s typestate resolution flow
//! (`UnresolvedPackage -> ResolvedPackage`): a single function turning
//! user-supplied, untrusted data into a validated, immutable value ready
//! for the rest of the pipeline to consume without re-checking it.

use crate::pathutil::clean_and_localize;
use rpack_schema::definition::{InputKind, PackDefinition};
use rpack_schema::error::InputResolutionError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One user-supplied input, fully resolved and validated against the pack's
/// declared inputs. Built once at run start; immutable thereafter
/// (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub name: String,
    pub user_path: String,
    pub resolved_abs_path: PathBuf,
    pub kind: InputKind,
}

/// Resolve every `{name -> user-path}` pair in a config against
/// `exec_path` and the pack's definition.
///
/// # Errors
///
/// Returns [`InputResolutionError`] if any user path is absolute or escapes
/// `exec_path`, does not exist on disk, is not declared by the pack
/// definition, or mismatches the definition's declared kind. Declaring the
/// same input name twice in the pack definition is also rejected.
pub fn resolve_inputs(
    exec_path: &Path,
    config_inputs: &BTreeMap<String, String>,
    definition: &PackDefinition,
) -> Result<Vec<ResolvedInput>, InputResolutionError> {
    let mut declared_names = std::collections::BTreeSet::new();
    for decl in &definition.inputs {
        if !declared_names.insert(decl.name.as_str()) {
            return Err(InputResolutionError::DuplicateDeclaration(
                decl.name.to_string(),
            ));
        }
    }

    let mut seen = std::collections::BTreeSet::new();
    let mut resolved = Vec::with_capacity(config_inputs.len());

    for (name, user_path) in config_inputs {
        if !seen.insert(name.as_str()) {
            return Err(InputResolutionError::DuplicateName(name.clone()));
        }

        let Some(decl) = definition.input(name) else {
            return Err(InputResolutionError::Undeclared { name: name.clone() });
        };

        let cleaned = clean_and_localize(name, user_path).map_err(|err| match err {
            rpack_schema::error::PathError::Absolute(_) => InputResolutionError::AbsolutePath {
                name: name.clone(),
                path: user_path.clone(),
            },
            _ => InputResolutionError::EscapesBase {
                name: name.clone(),
                path: user_path.clone(),
            },
        })?;

        let abs_path = exec_path.join(&cleaned);
        let meta = std::fs::metadata(&abs_path).map_err(|_| InputResolutionError::NotFound {
            name: name.clone(),
            path: user_path.clone(),
        })?;

        let observed = if meta.is_dir() {
            InputKind::Dir
        } else {
            InputKind::File
        };
        if observed != decl.kind {
            return Err(InputResolutionError::KindMismatch {
                name: name.clone(),
                declared: decl.kind.as_str(),
                observed: observed.as_str(),
            });
        }

        resolved.push(ResolvedInput {
            name: name.clone(),
            user_path: user_path.clone(),
            resolved_abs_path: abs_path,
            kind: observed,
        });
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpack_schema::ident::{InputName, PackName};

    fn definition(decls: &[(&str, InputKind)]) -> PackDefinition {
        PackDefinition {
            schema_version: "v1".to_string(),
            name: PackName::parse("demo").unwrap(),
            inputs: decls
                .iter()
                .map(|(name, kind)| rpack_schema::definition::InputDecl {
                    name: InputName::parse(*name).unwrap(),
                    kind: *kind,
                })
                .collect(),
        }
    }

    #[test]
    fn resolves_declared_file_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.yaml"), "- a\n").unwrap();

        let def = definition(&[("users.yaml", InputKind::File)]);
        let inputs = BTreeMap::from([("users.yaml".to_string(), "users.yaml".to_string())]);

        let resolved = resolve_inputs(dir.path(), &inputs, &def).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].kind, InputKind::File);
    }

    #[test]
    fn rejects_undeclared_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.yaml"), "").unwrap();
        let def = definition(&[]);
        let inputs = BTreeMap::from([("x.yaml".to_string(), "x.yaml".to_string())]);
        assert!(matches!(
            resolve_inputs(dir.path(), &inputs, &def),
            Err(InputResolutionError::Undeclared { .. })
        ));
    }

    #[test]
    fn rejects_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let def = definition(&[("users.yaml", InputKind::File)]);
        let inputs = BTreeMap::from([("users.yaml".to_string(), "missing.yaml".to_string())]);
        assert!(matches!(
            resolve_inputs(dir.path(), &inputs, &def),
            Err(InputResolutionError::NotFound { .. })
        ));
    }

    #[test]
    fn rejects_kind_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        let def = definition(&[("assets", InputKind::File)]);
        let inputs = BTreeMap::from([("assets".to_string(), "assets".to_string())]);
        assert!(matches!(
            resolve_inputs(dir.path(), &inputs, &def),
            Err(InputResolutionError::KindMismatch { .. })
        ));
    }

    #[test]
    fn rejects_absolute_user_path() {
        let dir = tempfile::tempdir().unwrap();
        let def = definition(&[("users.yaml", InputKind::File)]);
        let inputs = BTreeMap::from([("users.yaml".to_string(), "/etc/passwd".to_string())]);
        assert!(matches!(
            resolve_inputs(dir.path(), &inputs, &def),
            Err(InputResolutionError::AbsolutePath { .. })
        ));
    }

    #[test]
    fn rejects_escaping_user_path() {
        let dir = tempfile::tempdir().unwrap();
        let def = definition(&[("users.yaml", InputKind::File)]);
        let inputs = BTreeMap::from([("users.yaml".to_string(), "../users.yaml".to_string())]);
        assert!(matches!(
            resolve_inputs(dir.path(), &inputs, &def),
            Err(InputResolutionError::EscapesBase { .. })
        ));
    }

    #[test]
    fn empty_inputs_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let def = definition(&[("users.yaml", InputKind::File)]);
        let resolved = resolve_inputs(dir.path(), &BTreeMap::new(), &def).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn rejects_duplicate_declared_input_names() {
        let dir = tempfile::tempdir().unwrap();
        let def = definition(&[("x", InputKind::File), ("x", InputKind::Dir)]);
        assert!(matches!(
            resolve_inputs(dir.path(), &BTreeMap::new(), &def),
            Err(InputResolutionError::DuplicateDeclaration(_))
        ));
    }
}
