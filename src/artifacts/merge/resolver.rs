//! Three-way tree merge
//!
//! Both sides are diffed against the base and combined path by path:
//!
//! | ours      | theirs    | result                                  |
//! |-----------|-----------|-----------------------------------------|
//! | changed   | untouched | ours                                    |
//! | untouched | changed   | theirs                                  |
//! | same      | same      | either                                  |
//! | modified  | modified  | text merge, conflict markers on overlap |
//! | modified  | removed   | modify/delete conflict (and vice versa) |
//!
//! Paths neither side touched keep the base's blob.

use crate::areas::database::Database;
use crate::artifacts::diff::tree_diff::{Change, diff_trees};
use crate::artifacts::merge::merge3::{MergeLabels, conflict_block, merge3};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::tree::FlatTree;
use crate::errors::Result;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};

/// Where the merge reads and writes blob content
pub trait BlobStore {
    fn read_blob(&self, oid: &ObjectId) -> Result<Bytes>;
    fn write_blob(&self, content: &[u8]) -> Result<ObjectId>;
}

impl BlobStore for Database {
    fn read_blob(&self, oid: &ObjectId) -> Result<Bytes> {
        self.load_blob(oid).map(Blob::into_content)
    }

    fn write_blob(&self, content: &[u8]) -> Result<ObjectId> {
        self.put(ObjectType::Blob, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// Both sides changed the content differently
    Content,
    /// One side modified the file, the other removed it
    ModifyDelete,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::Content => write!(f, "content"),
            ConflictKind::ModifyDelete => write!(f, "modify/delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub path: String,
    pub kind: ConflictKind,
}

/// The combined tree; conflicted paths hold blobs with conflict markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTree {
    pub tree: FlatTree,
    pub conflicts: Vec<Conflict>,
}

impl MergedTree {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

pub struct Resolver<'s, S: BlobStore> {
    store: &'s S,
    labels: MergeLabels,
}

impl<'s, S: BlobStore> Resolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Resolver {
            store,
            labels: MergeLabels::default(),
        }
    }

    pub fn merge_trees(&self, base: &FlatTree, ours: &FlatTree, theirs: &FlatTree) -> Result<MergedTree> {
        let ours_changes = Self::by_path(diff_trees(base, ours));
        let theirs_changes = Self::by_path(diff_trees(base, theirs));

        let mut tree = base.clone();
        let mut conflicts = Vec::new();

        let paths = ours_changes
            .keys()
            .chain(theirs_changes.keys())
            .cloned()
            .collect::<BTreeSet<_>>();

        for path in paths {
            let outcome = match (ours_changes.get(&path), theirs_changes.get(&path)) {
                (Some(ours), None) => Ok(ours.new_oid.clone()),
                (None, Some(theirs)) => Ok(theirs.new_oid.clone()),
                (Some(ours), Some(theirs)) if ours.new_oid == theirs.new_oid => {
                    Ok(ours.new_oid.clone())
                }
                (Some(ours), Some(theirs)) => self.merge_both_changed(&path, ours, theirs)?,
                (None, None) => continue,
            };

            let value = match outcome {
                Ok(value) => value,
                Err(marked) => {
                    tracing::debug!(path = %marked.conflict.path, kind = %marked.conflict.kind, "merge conflict");
                    conflicts.push(marked.conflict);
                    Some(marked.oid)
                }
            };

            match value {
                Some(oid) => tree.insert(path, oid),
                None => tree.remove(&path),
            };
        }

        Ok(MergedTree { tree, conflicts })
    }

    fn by_path(changes: Vec<Change>) -> BTreeMap<String, Change> {
        changes
            .into_iter()
            .map(|change| (change.path.clone(), change))
            .collect()
    }

    /// Both sides changed `path` to different values
    fn merge_both_changed(
        &self,
        path: &str,
        ours: &Change,
        theirs: &Change,
    ) -> Result<std::result::Result<Option<ObjectId>, MarkedConflict>> {
        let read = |oid: &Option<ObjectId>| -> Result<Option<Bytes>> {
            oid.as_ref().map(|oid| self.store.read_blob(oid)).transpose()
        };

        let our_content = read(&ours.new_oid)?;
        let their_content = read(&theirs.new_oid)?;

        match (our_content, their_content) {
            (Some(our_content), Some(their_content)) => {
                let base_content = read(&ours.old_oid)?.unwrap_or_default();
                let merged = merge3(&base_content, &our_content, &their_content, &self.labels);
                let oid = self.store.write_blob(&merged.content)?;

                if merged.is_clean() {
                    tracing::debug!(%path, "merged content cleanly");
                    Ok(Ok(Some(oid)))
                } else {
                    Ok(Err(MarkedConflict::new(path, ConflictKind::Content, oid)))
                }
            }
            (our_content, their_content) => {
                let marked = conflict_block(
                    our_content.as_deref(),
                    their_content.as_deref(),
                    &self.labels,
                );
                let oid = self.store.write_blob(&marked)?;
                Ok(Err(MarkedConflict::new(path, ConflictKind::ModifyDelete, oid)))
            }
        }
    }
}

/// A conflict plus the blob holding its marked-up content
struct MarkedConflict {
    conflict: Conflict,
    oid: ObjectId,
}

impl MarkedConflict {
    fn new(path: &str, kind: ConflictKind, oid: ObjectId) -> Self {
        MarkedConflict {
            conflict: Conflict {
                path: path.to_string(),
                kind,
            },
            oid,
        }
    }
}
