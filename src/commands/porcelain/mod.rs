//! Porcelain commands
//!
//! User-facing workflows composed from the repository operations.
//!
//! - `init`: create a repository
//! - `add`: stage files
//! - `commit`: record the index as a commit
//! - `status`: branch, staged, unstaged and untracked changes
//! - `diff`: line diffs between HEAD, index and working tree
//! - `log`: commit history
//! - `branch`, `tag`: create, list and delete refs
//! - `checkout`, `reset`: move HEAD
//! - `merge`: three-way merge into HEAD
//! - `fetch`, `push`: exchange objects with another repository

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod diff;
pub mod fetch;
pub mod init;
pub mod log;
pub mod merge;
pub mod push;
pub mod reset;
pub mod status;
pub mod tag;
