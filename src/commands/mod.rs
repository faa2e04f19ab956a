//! Command implementations
//!
//! Commands are methods on [`Repository`](crate::areas::repository::Repository)
//! that print to its writer, split the way git splits them:
//!
//! - `plumbing`: direct object and index manipulation (hash-object, cat-file, ...)
//! - `porcelain`: user-facing workflows (add, commit, merge, ...)
//!
//! Where a command shares its name with the library operation it wraps, the
//! command method carries a `_command` suffix.

pub mod plumbing;
pub mod porcelain;
