//! Tree object
//!
//! A tree is one directory level: a list of names, each pointing at a blob
//! (file) or another tree (subdirectory).
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`, mode `40000` for subtrees and
//! `100644` for blobs. Entries are kept in a `BTreeMap`, so serialization is
//! always in byte order of the name regardless of insertion order.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

const TREE_MODE: &str = "40000";
const BLOB_MODE: &str = "100644";

/// What a tree entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl EntryKind {
    pub fn mode(&self) -> &'static str {
        match self {
            EntryKind::Blob => BLOB_MODE,
            EntryKind::Tree => TREE_MODE,
        }
    }

    pub fn from_mode(mode: &str) -> Result<Self> {
        match mode {
            BLOB_MODE | "100755" => Ok(EntryKind::Blob),
            TREE_MODE | "040000" => Ok(EntryKind::Tree),
            _ => Err(Error::InvalidTreeEntry(format!("unknown mode {mode}"))),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryKind::Blob => ObjectType::Blob,
            EntryKind::Tree => ObjectType::Tree,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub oid: ObjectId,
}

impl TreeEntry {
    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }
}

/// A single directory level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Insert an entry, validating its name
    pub fn add_entry(&mut self, name: &str, entry: TreeEntry) -> Result<()> {
        validate_entry_name(name)?;
        self.entries.insert(name.to_string(), entry);

        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &TreeEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, TreeEntry)> {
        self.entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single path component: non-empty, no `/` or NUL, not `.` or `..`.
pub fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(Error::InvalidTreeEntry(format!(
            "invalid entry name {name:?}"
        )));
    }

    Ok(())
}

impl Packable for Tree {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = Vec::new();

        for (name, entry) in &self.entries {
            let header = format!("{} {}\0", entry.kind.mode(), name);
            content.extend_from_slice(header.as_bytes());
            entry
                .oid
                .write_h40_to(&mut content)
                .map_err(|e| Error::InvalidObject(e.to_string()))?;
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tree {
    fn deserialize(payload: &[u8]) -> Result<Self> {
        let mut tree = Tree::default();
        let mut reader = payload;

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader
                .read_until(b' ', &mut mode_bytes)
                .map_err(|e| Error::InvalidTreeEntry(e.to_string()))?;
            if n == 0 {
                break;
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(Error::InvalidTreeEntry("unexpected EOF in mode".to_string()));
            }
            let mode = std::str::from_utf8(&mode_bytes)
                .map_err(|_| Error::InvalidTreeEntry("non UTF-8 mode".to_string()))?;
            let kind = EntryKind::from_mode(mode)?;

            name_bytes.clear();
            reader
                .read_until(b'\0', &mut name_bytes)
                .map_err(|e| Error::InvalidTreeEntry(e.to_string()))?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(Error::InvalidTreeEntry("unexpected EOF in name".to_string()));
            }
            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| Error::InvalidTreeEntry("non UTF-8 name".to_string()))?;

            let oid = ObjectId::read_h40_from(&mut reader).map_err(|_| {
                Error::InvalidTreeEntry(format!("unexpected EOF in object id of {name}"))
            })?;

            if tree.entries.contains_key(name) {
                return Err(Error::InvalidTreeEntry(format!("duplicate entry {name}")));
            }
            tree.add_entry(name, TreeEntry::new(kind, oid))?;
        }

        Ok(tree)
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(name, entry)| {
                format!(
                    "{:0>6} {} {}\t{}",
                    entry.kind.mode(),
                    entry.kind.object_type(),
                    entry.oid,
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
