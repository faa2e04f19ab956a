//! Content-addressable object database
//!
//! Objects are framed (`<kind> <len>\0<payload>`), hashed, zlib-compressed and
//! written once under `objects/<2 hex>/<38 hex>`. Writes go through a temp file
//! and a rename so a half-written object is never visible under its final name.
//! An existing object is never rewritten: identical content means identical ID.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable, hash_object};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{Error, IoContext, Result};
use bytes::Bytes;
use fake::rand;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// A decoded object: its kind and raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub kind: ObjectType,
    pub payload: Bytes,
}

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    /// Open the object store
    ///
    /// # Arguments
    ///
    /// * `path` - The objects directory (typically `.kit/objects`)
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    /// Store `(kind, payload)` and return its OID
    ///
    /// A no-op when the object already exists.
    ///
    /// # Arguments
    ///
    /// * `kind` - Object type written into the header
    /// * `payload` - Serialized object body, without the header
    ///
    /// # Returns
    ///
    /// The SHA-1 of the framed object, which is also where it is stored
    pub fn put(&self, kind: ObjectType, payload: &[u8]) -> Result<ObjectId> {
        let oid = hash_object(kind, payload)?;
        let object_path = self.path.join(oid.to_path());

        if object_path.exists() {
            tracing::trace!(%oid, %kind, "object already stored");
            return Ok(oid);
        }

        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::InvalidObject(format!("invalid object path {oid}")))?;
        std::fs::create_dir_all(object_dir).at(object_dir)?;

        self.write_object(&object_path, &kind.frame(payload))?;
        tracing::debug!(%oid, %kind, size = payload.len(), "stored object");

        Ok(oid)
    }

    /// Store a typed object
    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        self.put(object.object_type(), &object.serialize()?)
    }

    /// Load an object whole
    ///
    /// # Arguments
    ///
    /// * `oid` - The full object ID to read
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` when nothing is stored under `oid`, `InvalidObject`
    /// when the stored bytes do not decompress to a well-formed object.
    pub fn get(&self, oid: &ObjectId) -> Result<RawObject> {
        let framed = self.read_framed(oid)?;
        let mut reader = Cursor::new(framed);

        let (kind, size) = ObjectType::parse_header(&mut reader)?;
        let start = reader.position() as usize;
        let framed = reader.into_inner();
        let payload = framed.slice(start..);

        if payload.len() != size {
            return Err(Error::InvalidObject(format!(
                "object {oid} declares {size} bytes but holds {}",
                payload.len()
            )));
        }

        Ok(RawObject { kind, payload })
    }

    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.path.join(oid.to_path()).is_file()
    }

    pub fn parse_object(&self, oid: &ObjectId) -> Result<ObjectBox> {
        let raw = self.get(oid)?;

        match raw.kind {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(&raw.payload)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(&raw.payload)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(
                &raw.payload,
            )?))),
        }
    }

    pub fn load_blob(&self, oid: &ObjectId) -> Result<Blob> {
        let raw = self.get_expecting(oid, ObjectType::Blob)?;
        Blob::deserialize(&raw.payload)
    }

    pub fn load_tree(&self, oid: &ObjectId) -> Result<Tree> {
        let raw = self.get_expecting(oid, ObjectType::Tree)?;
        Tree::deserialize(&raw.payload)
    }

    /// Load and decode a commit
    ///
    /// # Errors
    ///
    /// `UnexpectedObjectType` when `oid` names a blob or a tree.
    pub fn load_commit(&self, oid: &ObjectId) -> Result<Commit> {
        let raw = self.get_expecting(oid, ObjectType::Commit)?;
        Commit::deserialize(&raw.payload)
    }

    /// Get the type of a stored object
    ///
    /// # Arguments
    ///
    /// * `oid` - The full object ID to check
    ///
    /// # Returns
    ///
    /// The type from the object's header: blob, tree or commit
    pub fn get_object_type(&self, oid: &ObjectId) -> Result<ObjectType> {
        Ok(self.get(oid)?.kind)
    }

    fn get_expecting(&self, oid: &ObjectId, expected: ObjectType) -> Result<RawObject> {
        let raw = self.get(oid)?;

        if raw.kind != expected {
            return Err(Error::UnexpectedObjectType {
                oid: oid.clone(),
                expected,
                actual: raw.kind,
            });
        }

        Ok(raw)
    }

    /// Copy an object's stored bytes into another database unless it is there already
    ///
    /// Returns whether anything was copied.
    pub fn copy_object_to(&self, oid: &ObjectId, other: &Database) -> Result<bool> {
        if other.contains(oid) {
            return Ok(false);
        }

        let source = self.path.join(oid.to_path());
        if !source.is_file() {
            return Err(Error::ObjectNotFound(oid.clone()));
        }

        let target = other.path.join(oid.to_path());
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).at(parent)?;
        }

        let compressed = std::fs::read(&source).at(&source)?;
        other.write_compressed(&target, &compressed)?;
        tracing::debug!(%oid, to = %other.path.display(), "copied object");

        Ok(true)
    }

    /// Find all objects whose OID starts with the given prefix.
    ///
    /// Used to resolve abbreviated OIDs.
    ///
    /// # Arguments
    ///
    /// * `prefix` - A hexadecimal string prefix (e.g., "abc", "a1b2c3")
    ///
    /// # Returns
    ///
    /// Every matching ObjectId, sorted. More than one match means the prefix is
    /// ambiguous; the caller decides what to do about it.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let mut matches = Vec::new();

        if prefix.len() < 2 {
            return Ok(matches);
        }

        let (dir_name, file_prefix) = prefix.split_at(2);
        let dir_path = self.path.join(dir_name);

        if !dir_path.is_dir() {
            return Ok(matches);
        }

        for entry in std::fs::read_dir(&dir_path).at(&dir_path)? {
            let entry = entry.at(&dir_path)?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(file_prefix)
                && let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}"))
            {
                matches.push(oid);
            }
        }
        matches.sort();

        Ok(matches)
    }

    fn read_framed(&self, oid: &ObjectId) -> Result<Bytes> {
        let object_path = self.path.join(oid.to_path());

        let compressed = match std::fs::read(&object_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ObjectNotFound(oid.clone()));
            }
            Err(e) => return Err(Error::io(object_path, e)),
        };

        Self::decompress(&compressed).at(object_path)
    }

    fn write_object(&self, object_path: &Path, framed: &[u8]) -> Result<()> {
        let compressed = Self::compress(framed).at(object_path)?;
        self.write_compressed(object_path, &compressed)
    }

    fn write_compressed(&self, object_path: &Path, compressed: &[u8]) -> Result<()> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::InvalidObject(format!("invalid object path {}", object_path.display())))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .at(&temp_object_path)?;
        file.write_all(compressed).at(&temp_object_path)?;

        // rename the temp file onto the object path to make it atomic
        std::fs::rename(&temp_object_path, object_path).at(object_path)?;

        Ok(())
    }

    fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(data: &[u8]) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;

        Ok(decompressed.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// Number of loose objects on disk
    pub fn count_objects(&self) -> Result<usize> {
        let mut count = 0;
        for entry in walkdir::WalkDir::new(&self.path).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(PathBuf::from).unwrap_or_default();
                Error::io(path, std::io::Error::other(e.to_string()))
            })?;
            if entry.file_type().is_file() {
                count += 1;
            }
        }

        Ok(count)
    }
}
