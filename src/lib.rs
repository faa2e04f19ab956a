//! kit: a small content-addressed version control system
//!
//! - `areas`: on-disk stores (objects, index, refs, working tree) and the
//!   repository handle
//! - `artifacts`: object formats and the algorithms over them
//! - `commands`: plumbing and porcelain commands printed by the CLI
//! - `config`: author identity, default branch and ignore rules
//! - `errors`: error kinds of the storage and graph layers

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;
