//! Plumbing commands
//!
//! - `hash-object`: compute a blob ID and optionally store it
//! - `cat-file`: print an object or its type
//! - `write-tree`: store the index as tree objects
//! - `read-tree`: load a tree into the index and working tree
//! - `merge-base`: nearest common ancestor of two commits

pub mod cat_file;
pub mod hash_object;
pub mod merge_base;
pub mod read_tree;
pub mod write_tree;
