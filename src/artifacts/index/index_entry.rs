//! Index entry representation
//!
//! Each entry maps a slash-separated path (relative to the repository root) to
//! the blob holding its staged content.
//!
//! ## Entry Format
//!
//! ```text
//! path length (u32, big endian)
//! path bytes (UTF-8, no terminator)
//! object id (20 raw bytes)
//! ```

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::validate_entry_name;
use crate::errors::{Error, Result};
use byteorder::{NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::path::{Component, Path};

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Slash-separated path relative to the repository root
    pub path: String,
    /// Blob holding the staged content
    pub oid: ObjectId,
}

impl IndexEntry {
    /// Every ancestor directory, outermost first
    ///
    /// `a/b/c` yields `["a", "a/b"]`.
    pub fn parent_dirs(&self) -> Vec<&str> {
        self.path
            .match_indices('/')
            .map(|(idx, _)| &self.path[..idx])
            .collect()
    }

    pub fn serialize(&self) -> Result<Bytes> {
        let path_len = u32::try_from(self.path.len())
            .map_err(|_| Error::CorruptIndex(format!("path too long: {}", self.path)))?;

        let mut entry_bytes = Vec::with_capacity(4 + self.path.len() + 20);
        entry_bytes
            .write_u32::<NetworkEndian>(path_len)
            .and_then(|_| {
                entry_bytes.extend_from_slice(self.path.as_bytes());
                self.oid.write_h40_to(&mut entry_bytes)
            })
            .map_err(|e| Error::CorruptIndex(e.to_string()))?;

        Ok(Bytes::from(entry_bytes))
    }
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.path.cmp(&other.path)
    }
}

/// Validate a slash-separated repository path
///
/// Every component must be a valid tree entry name, so a staged path can
/// always be materialized as a tree.
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidTreeEntry("empty path".to_string()));
    }

    path.split('/').try_for_each(validate_entry_name)
}

/// Turn a filesystem-relative path into a slash-separated repository path
pub fn to_repo_path(path: &Path) -> Result<String> {
    let components = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .map(|component| match component {
            Component::Normal(name) => name.to_str().map(str::to_string).ok_or_else(|| {
                Error::InvalidTreeEntry(format!("non UTF-8 path {}", path.display()))
            }),
            _ => Err(Error::InvalidTreeEntry(format!(
                "path escapes the repository: {}",
                path.display()
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    let repo_path = components.join("/");
    validate_path(&repo_path)?;

    Ok(repo_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object::hash_object;
    use crate::artifacts::objects::object_type::ObjectType;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn oid() -> ObjectId {
        hash_object(ObjectType::Blob, b"test data").unwrap()
    }

    #[rstest]
    fn parent_dirs_of_nested_entry(oid: ObjectId) {
        let entry = IndexEntry::new("a/b/c".to_string(), oid);
        assert_eq!(entry.parent_dirs(), vec!["a", "a/b"]);
    }

    #[rstest]
    fn parent_dirs_of_root_entry(oid: ObjectId) {
        let entry = IndexEntry::new("a".to_string(), oid);
        assert_eq!(entry.parent_dirs(), Vec::<&str>::new());
    }

    #[rstest]
    #[case("a//b")]
    #[case("/a")]
    #[case("a/../b")]
    #[case("a/./b")]
    #[case("")]
    fn invalid_paths_are_rejected(#[case] path: &str) {
        assert!(validate_path(path).is_err());
    }

    #[test]
    fn filesystem_paths_become_slash_separated() {
        let path = Path::new(".").join("dir").join("file.txt");
        assert_eq!(to_repo_path(&path).unwrap(), "dir/file.txt");
        assert!(to_repo_path(Path::new("../outside")).is_err());
    }
}
