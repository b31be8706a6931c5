//! The embedded script host and its two stateless collaborators: the
//! template renderer and the jq-style query interpreter (`spec.md` §6.2,
//! §9).

pub mod query;
pub mod rhai_engine;
pub mod template;

pub use rhai_engine::ScriptHost;
