//! Storage areas of a repository
//!
//! - `database`: content-addressable object store
//! - `index`: staging area, `path -> blob`
//! - `refs`: HEAD, branches, tags, remote branches and `MERGE_HEAD`
//! - `merge_state`: unresolved paths of a conflicted merge
//! - `workspace`: working tree files
//! - `repository`: the handle tying them together
//! - `remote`: fetch and push between two repositories

pub mod database;
pub mod index;
pub mod merge_state;
pub mod refs;
pub mod remote;
pub mod repository;
pub mod workspace;
