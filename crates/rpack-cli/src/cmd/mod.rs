//! Thin per-subcommand dispatch, one module per `Commands` variant.

pub mod check;
pub mod run;
