//! Lexical path cleaning and locality checks shared by every resolver
//! (`spec.md` §4.1 "Uniform path rules").
//!
//! No teacher file owns this directly — the teacher never mediates
//! script-chosen paths — but it is written in the teacher's plain-function,
//! `thiserror`-returning style (see `rpack-schema::error::PathError`).

use rpack_schema::error::PathError;
use std::path::{Component, Path, PathBuf};

/// Lexically clean `rel` (resolve `.` and `..` without touching the
/// filesystem) and confirm the result is non-absolute and does not escape
/// its base.
///
/// # Errors
///
/// Returns [`PathError::Absolute`] if `rel` is an absolute path, or
/// [`PathError::Escapes`] if resolving `..` segments would leave the base
/// directory.
pub fn clean_and_localize(friendly: &str, rel: &str) -> Result<PathBuf, PathError> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return Err(PathError::Absolute(friendly.to_string()));
    }

    let mut cleaned = Vec::new();
    for component in rel_path.components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if cleaned.pop().is_none() {
                    return Err(PathError::Escapes {
                        friendly: friendly.to_string(),
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Absolute(friendly.to_string()));
            }
        }
    }

    Ok(cleaned.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_simple_relative_path() {
        let cleaned = clean_and_localize("map:a", "dir/file.txt").unwrap();
        assert_eq!(cleaned, PathBuf::from("dir/file.txt"));
    }

    #[test]
    fn collapses_dot_segments() {
        let cleaned = clean_and_localize("map:a", "./dir/./file.txt").unwrap();
        assert_eq!(cleaned, PathBuf::from("dir/file.txt"));
    }

    #[test]
    fn resolves_internal_parent_segments() {
        let cleaned = clean_and_localize("map:a", "dir/sub/../file.txt").unwrap();
        assert_eq!(cleaned, PathBuf::from("dir/file.txt"));
    }

    #[test]
    fn rejects_absolute_path() {
        assert!(matches!(
            clean_and_localize("map:a", "/etc/passwd"),
            Err(PathError::Absolute(_))
        ));
    }

    #[test]
    fn rejects_escape_via_leading_parent() {
        assert!(matches!(
            clean_and_localize("map:a", "../escape.txt"),
            Err(PathError::Escapes { .. })
        ));
    }

    #[test]
    fn rejects_escape_after_descending_back_out() {
        assert!(matches!(
            clean_and_localize("map:a", "dir/../../escape.txt"),
            Err(PathError::Escapes { .. })
        ));
    }

    #[test]
    fn empty_relative_path_cleans_to_empty() {
        let cleaned = clean_and_localize("map:a", "").unwrap();
        assert_eq!(cleaned, PathBuf::new());
    }
}
