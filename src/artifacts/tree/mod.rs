//! Tree materialization
//!
//! Converts between the flat `path -> blob` mapping held by the index and the
//! nested tree objects stored in the database.
//!
//! - `builder`: flat mapping to tree objects (write-tree)
//! - `flatten`: tree objects to flat mapping (read-tree)
//!
//! Both directions use an index-based arena or an explicit work stack, never
//! recursion, so deep trees cannot exhaust the call stack.

pub mod builder;
pub mod flatten;

/// Deepest directory nesting accepted when reading a tree
pub const MAX_TREE_DEPTH: usize = 256;

use crate::artifacts::objects::object_id::ObjectId;
use std::collections::BTreeMap;

/// Flat `path -> blob` mapping, slash separated paths in byte order
pub type FlatTree = BTreeMap<String, ObjectId>;
