//! Path resolvers: the four built-in prefix namespaces, tried in order
//! (`spec.md` §4.1).
//!
//! Grounded on the teacher's `resolver.rs`: an ordered list of components
//! that each claim a namespace and the first match wins — generalized here
//! from dependency-name resolution to path-prefix resolution. Resolvers are
//! polymorphic over `{resolve(name) -> (handle, matched, error?)}`
//! (`spec.md` §9); `try_resolve` returning `Option<Result<_>>` is that same
//! shape: `None` means "not my prefix", `Some` means "mine, and here's the
//! outcome".

use crate::handle::FileHandle;
use crate::inputs::ResolvedInput;
use crate::pathutil::clean_and_localize;
use rpack_schema::error::PathError;
use std::path::Path;

/// Which resolver produced a handle. Carried by handles instead of a
/// back-pointer to the resolver itself (`spec.md` §9 "Avoid cyclic
/// references").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverId {
    Rpack,
    Temp,
    Map,
    Target,
}

/// A single prefix-namespace resolver.
pub trait Resolver: Send + Sync {
    /// Attempt to resolve `friendly`. Returns `None` if this resolver does
    /// not own `friendly`'s prefix; `Some(Err(_))` if it owns the prefix but
    /// the remainder is invalid or (for `map:`) the input name is unknown.
    fn try_resolve(&self, friendly: &str) -> Option<Result<FileHandle, PathError>>;
}

/// `rpack:REL` -> `source_path/REL`.
pub struct RpackResolver {
    source_path: std::path::PathBuf,
}

impl RpackResolver {
    pub fn new(source_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
        }
    }
}

impl Resolver for RpackResolver {
    fn try_resolve(&self, friendly: &str) -> Option<Result<FileHandle, PathError>> {
        let rel = friendly.strip_prefix("rpack:")?;
        Some(resolve_prefixed(
            ResolverId::Rpack,
            friendly,
            rel,
            &self.source_path,
            false,
        ))
    }
}

/// `temp:REL` -> `temp_path/REL`. Writes through this resolver are never
/// committed; `indirect_target_path` is kept empty since these handles are
/// never part of the target write set.
pub struct TempResolver {
    temp_path: std::path::PathBuf,
}

impl TempResolver {
    pub fn new(temp_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            temp_path: temp_path.into(),
        }
    }
}

impl Resolver for TempResolver {
    fn try_resolve(&self, friendly: &str) -> Option<Result<FileHandle, PathError>> {
        let rel = friendly.strip_prefix("temp:")?;
        Some(resolve_prefixed(
            ResolverId::Temp,
            friendly,
            rel,
            &self.temp_path,
            false,
        ))
    }
}

/// `map:NAME[/REL]` -> `resolved_input[NAME].resolved_abs_path[/REL]`.
/// Extra `REL` is only permitted when the mapped input is a directory.
pub struct MapResolver {
    inputs: Vec<ResolvedInput>,
}

impl MapResolver {
    pub fn new(inputs: Vec<ResolvedInput>) -> Self {
        Self { inputs }
    }

    fn find(&self, name: &str) -> Option<&ResolvedInput> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

impl Resolver for MapResolver {
    fn try_resolve(&self, friendly: &str) -> Option<Result<FileHandle, PathError>> {
        let rest = friendly.strip_prefix("map:")?;
        let (name, extra) = match rest.split_once('/') {
            Some((name, extra)) => (name, Some(extra)),
            None => (rest, None),
        };

        let Some(input) = self.find(name) else {
            return Some(Err(PathError::UnknownPrefix(friendly.to_string())));
        };

        match extra {
            None => Some(Ok(FileHandle::new(
                ResolverId::Map,
                friendly,
                input.resolved_abs_path.clone(),
                name,
            ))),
            Some(extra) => {
                if input.kind != rpack_schema::definition::InputKind::Dir {
                    return Some(Err(PathError::ExtraSegmentOnFileInput {
                        friendly: friendly.to_string(),
                        extra: extra.to_string(),
                    }));
                }
                let cleaned = match clean_and_localize(friendly, extra) {
                    Ok(cleaned) => cleaned,
                    Err(err) => return Some(Err(err)),
                };
                let indirect_target_path = format!("{name}/{}", cleaned.to_string_lossy());
                Some(Ok(FileHandle::new(
                    ResolverId::Map,
                    friendly,
                    input.resolved_abs_path.join(&cleaned),
                    indirect_target_path,
                )))
            }
        }
    }
}

/// `REL` (no prefix) -> `run_path/REL`, with `indirect_target_path = REL`.
pub struct TargetResolver {
    run_path: std::path::PathBuf,
}

impl TargetResolver {
    pub fn new(run_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            run_path: run_path.into(),
        }
    }
}

impl Resolver for TargetResolver {
    fn try_resolve(&self, friendly: &str) -> Option<Result<FileHandle, PathError>> {
        if friendly.contains(':') {
            // Looks like it's meant for another (unknown) resolver's prefix.
            return None;
        }
        Some(resolve_prefixed(
            ResolverId::Target,
            friendly,
            friendly,
            &self.run_path,
            true,
        ))
    }
}

fn resolve_prefixed(
    resolver_id: ResolverId,
    friendly: &str,
    rel: &str,
    base: &Path,
    route_to_target: bool,
) -> Result<FileHandle, PathError> {
    let cleaned = clean_and_localize(friendly, rel)?;
    let indirect_target_path = if route_to_target {
        cleaned.to_string_lossy().into_owned()
    } else {
        String::new()
    };
    Ok(FileHandle::new(
        resolver_id,
        friendly,
        base.join(&cleaned),
        indirect_target_path,
    ))
}

/// The ordered, closed set of resolvers tried for every friendly path.
pub struct ResolverSet {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverSet {
    pub fn new(
        source_path: impl Into<std::path::PathBuf>,
        temp_path: impl Into<std::path::PathBuf>,
        run_path: impl Into<std::path::PathBuf>,
        resolved_inputs: Vec<ResolvedInput>,
    ) -> Self {
        Self {
            resolvers: vec![
                Box::new(RpackResolver::new(source_path)),
                Box::new(TempResolver::new(temp_path)),
                Box::new(MapResolver::new(resolved_inputs)),
                Box::new(TargetResolver::new(run_path)),
            ],
        }
    }

    /// Resolve a friendly path via the first owning resolver.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::UnknownPrefix`] if no resolver claims
    /// `friendly`'s prefix, or whatever error the owning resolver produced.
    pub fn resolve(&self, friendly: &str) -> Result<FileHandle, PathError> {
        for resolver in &self.resolvers {
            if let Some(result) = resolver.try_resolve(friendly) {
                return result;
            }
        }
        Err(PathError::UnknownPrefix(friendly.to_string()))
    }
}
