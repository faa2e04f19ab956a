//! Object formats and the algorithms over them
//!
//! - `branch`: ref names and revision expressions
//! - `diff`: tree diffs and line diffs
//! - `index`: index file entries and checksum
//! - `log`: history traversal
//! - `merge`: merge base, line merge and tree merge
//! - `objects`: blobs, trees and commits
//! - `tree`: flat `path -> blob` mappings and the nested tree codec

pub mod branch;
pub mod diff;
pub mod index;
pub mod log;
pub mod merge;
pub mod objects;
pub mod tree;
