//! Tree objects to flat mapping
//!
//! Walks a tree with an explicit stack of `(prefix, oid, depth)` frames. The
//! depth bound turns a maliciously deep (or cyclic-looking) tree into an
//! `InvalidTreeEntry` instead of an unbounded walk.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{EntryKind, Tree};
use crate::artifacts::tree::{FlatTree, MAX_TREE_DEPTH};
use crate::errors::{Error, Result};

/// Flatten the tree rooted at `root` into `path -> blob`
///
/// `load` fetches a tree object by OID.
pub fn flatten<F>(root: &ObjectId, load: F) -> Result<FlatTree>
where
    F: Fn(&ObjectId) -> Result<Tree>,
{
    let mut flat = FlatTree::new();
    let mut stack = vec![(String::new(), root.clone(), 0usize)];

    while let Some((prefix, oid, depth)) = stack.pop() {
        if depth > MAX_TREE_DEPTH {
            return Err(Error::InvalidTreeEntry(format!(
                "tree nesting exceeds {MAX_TREE_DEPTH} levels at {prefix}"
            )));
        }

        for (name, entry) in load(&oid)?.into_entries() {
            let path = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };

            match entry.kind {
                EntryKind::Blob => {
                    flat.insert(path, entry.oid);
                }
                EntryKind::Tree => stack.push((path, entry.oid, depth + 1)),
            }
        }
    }

    Ok(flat)
}
