//! Flat mapping to tree objects
//!
//! Directories become nodes in an arena (`Vec<DirNode>`) addressed by index.
//! A child is always pushed after its parent, so walking the arena from the
//! back visits every directory after all of its subdirectories: an iterative
//! post-order that hands each tree to the sink once its children have OIDs.

use crate::artifacts::index::index_entry::validate_path;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{EntryKind, Tree, TreeEntry};
use crate::artifacts::tree::FlatTree;
use crate::errors::{Error, Result};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct DirNode {
    dirs: BTreeMap<String, usize>,
    files: BTreeMap<String, ObjectId>,
}

#[derive(Debug)]
pub struct TreeBuilder {
    arena: Vec<DirNode>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder {
            arena: vec![DirNode::default()],
        }
    }
}

impl TreeBuilder {
    pub fn from_flat(flat: &FlatTree) -> Result<Self> {
        let mut builder = TreeBuilder::default();
        for (path, oid) in flat {
            builder.insert(path, oid.clone())?;
        }

        Ok(builder)
    }

    /// Place a blob at a slash separated path, creating directory nodes
    pub fn insert(&mut self, path: &str, oid: ObjectId) -> Result<()> {
        validate_path(path)?;

        let (dirs, name) = match path.rsplit_once('/') {
            Some((dirs, name)) => (Some(dirs), name),
            None => (None, path),
        };

        let mut node = 0;
        for component in dirs.into_iter().flat_map(|dirs| dirs.split('/')) {
            if self.arena[node].files.contains_key(component) {
                return Err(Error::InvalidTreeEntry(format!(
                    "{path} is nested under a file"
                )));
            }

            node = match self.arena[node].dirs.get(component) {
                Some(&child) => child,
                None => {
                    let child = self.arena.len();
                    self.arena.push(DirNode::default());
                    self.arena[node].dirs.insert(component.to_string(), child);
                    child
                }
            };
        }

        if self.arena[node].dirs.contains_key(name) {
            return Err(Error::InvalidTreeEntry(format!("{path} is a directory")));
        }
        self.arena[node].files.insert(name.to_string(), oid);

        Ok(())
    }

    /// Emit every tree, deepest first, and return the root tree's OID
    ///
    /// `store` receives each tree once all of its subtrees have been stored.
    pub fn build<F>(self, mut store: F) -> Result<ObjectId>
    where
        F: FnMut(&Tree) -> Result<ObjectId>,
    {
        let mut oids: Vec<Option<ObjectId>> = vec![None; self.arena.len()];

        for (idx, node) in self.arena.iter().enumerate().rev() {
            let mut tree = Tree::default();

            for (name, oid) in &node.files {
                tree.add_entry(name, TreeEntry::new(EntryKind::Blob, oid.clone()))?;
            }
            for (name, &child) in &node.dirs {
                let child_oid = oids[child].clone().ok_or_else(|| {
                    Error::InvalidTreeEntry(format!("subtree {name} was not built"))
                })?;
                tree.add_entry(name, TreeEntry::new(EntryKind::Tree, child_oid))?;
            }

            oids[idx] = Some(store(&tree)?);
        }

        oids.swap_remove(0)
            .ok_or_else(|| Error::InvalidTreeEntry("root tree was not built".to_string()))
    }
}

/// Build the tree objects for a flat mapping and return the root OID
pub fn write_tree<F>(flat: &FlatTree, store: F) -> Result<ObjectId>
where
    F: FnMut(&Tree) -> Result<ObjectId>,
{
    TreeBuilder::from_flat(flat)?.build(store)
}
