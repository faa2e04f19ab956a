//! Staging area
//!
//! The index tracks which blob each path will hold in the next commit.
//!
//! ## Data Structures
//!
//! - `entries`: Maps paths to their index entries
//! - `children`: Maps directory paths to the entries below them, so a file
//!   replacing a directory (or the reverse) can discard the clashing entries

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::{CHECKSUM_SIZE, HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::OBJECT_ID_BYTES;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::tree::FlatTree;
use crate::errors::{Error, IoContext, Result};
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (`.kit/index`)
    path: Box<Path>,
    entries: BTreeMap<String, IndexEntry>,
    children: BTreeMap<String, BTreeSet<String>>,
    /// Set when the in-memory entries differ from what was loaded
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the index from disk
    ///
    /// A missing or empty file is an empty index. Acquires a shared lock on the
    /// index file while reading.
    pub fn rehydrate(&mut self) -> Result<()> {
        self.entries.clear();
        self.children.clear();
        self.changed = false;

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.path)
            .at(&*self.path)?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)
            .at(&*self.path)?;

        let size = lock.metadata().at(&*self.path)?.len() as usize;
        if size == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(&mut **lock);
        let entries_count = Self::parse_header(&mut reader)?;
        let entries_size = size.saturating_sub(HEADER_SIZE + CHECKSUM_SIZE);
        self.parse_entries(entries_count, entries_size, &mut reader)?;

        reader.verify()?;
        tracing::trace!(entries = self.entries.len(), "loaded index");

        Ok(())
    }

    fn parse_header(reader: &mut Checksum<&mut std::fs::File>) -> Result<u32> {
        let header = reader.read(HEADER_SIZE)?;

        if &header[..4] != SIGNATURE.as_bytes() {
            return Err(Error::CorruptIndex("invalid index file signature".to_string()));
        }

        let version = NetworkEndian::read_u32(&header[4..8]);
        if version != VERSION {
            return Err(Error::CorruptIndex(format!(
                "unsupported index file version: {version}"
            )));
        }

        Ok(NetworkEndian::read_u32(&header[8..12]))
    }

    /// Read `entries_count` entries, none of which may run past `entries_size`
    /// bytes
    fn parse_entries(
        &mut self,
        entries_count: u32,
        entries_size: usize,
        reader: &mut Checksum<&mut std::fs::File>,
    ) -> Result<()> {
        let mut remaining = entries_size;

        for _ in 0..entries_count {
            let path_len = NetworkEndian::read_u32(&reader.read(4)?) as usize;
            remaining = remaining
                .checked_sub(4 + OBJECT_ID_BYTES)
                .and_then(|left| left.checked_sub(path_len))
                .ok_or_else(|| {
                    Error::CorruptIndex(format!(
                        "entry path length {path_len} runs past the end of the index"
                    ))
                })?;

            let path = String::from_utf8(reader.read(path_len)?)
                .map_err(|_| Error::CorruptIndex("non UTF-8 path".to_string()))?;
            let oid = ObjectId::from_digest(&reader.read(OBJECT_ID_BYTES)?)?;

            self.store_entry(IndexEntry::new(path, oid));
        }

        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Remove entries that would clash with the new entry
    ///
    /// A file entry at any parent directory goes, and so does everything below
    /// the new entry's own path.
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.path);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(entry.path.clone());
        }

        self.entries.insert(entry.path.clone(), entry);
    }

    fn remove_children(&mut self, path: &str) {
        if let Some(children) = self.children.remove(path) {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn remove_entry(&mut self, path: &str) {
        let Some(entry) = self.entries.remove(path) else {
            return;
        };

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(path);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }
    }

    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);
        self.changed = true;
    }

    /// Remove a file entry or every entry below a directory
    pub fn remove(&mut self, path: &str) {
        self.remove_entry(path);
        self.remove_children(path);
        self.changed = true;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.changed = true;
    }

    /// Replace every entry with the given flat mapping
    pub fn replace(&mut self, flat: &FlatTree) {
        self.clear();
        for (path, oid) in flat {
            self.store_entry(IndexEntry::new(path.clone(), oid.clone()));
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Persist the index under an exclusive lock
    pub fn write_updates(&mut self) -> Result<()> {
        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .at(&*self.path)?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)
            .at(&*self.path)?;

        let mut writer = Checksum::new(&mut **lock);

        let entries_count = u32::try_from(self.entries.len())
            .map_err(|_| Error::CorruptIndex("too many entries".to_string()))?;
        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend_from_slice(SIGNATURE.as_bytes());
        header
            .write_u32::<NetworkEndian>(VERSION)
            .and_then(|_| header.write_u32::<NetworkEndian>(entries_count))
            .at(&*self.path)?;
        writer.write(&header).at(&*self.path)?;

        for entry in self.entries.values() {
            writer.write(&entry.serialize()?).at(&*self.path)?;
        }

        writer.write_checksum().at(&*self.path)?;
        self.changed = false;
        tracing::debug!(entries = self.entries.len(), "wrote index");

        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The staged content as a flat `path -> blob` mapping
    pub fn snapshot(&self) -> FlatTree {
        self.entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.oid.clone()))
            .collect()
    }
}
