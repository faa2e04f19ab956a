//! Error kinds surfaced by the storage and graph layers
//!
//! The object store, ref store and tree codec return [`Error`] so callers can
//! match on what went wrong (a missing object is not the same failure as an
//! unwritable disk). The command layer wraps these into `anyhow` with context.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("object {oid} is a {actual}, expected a {expected}")]
    UnexpectedObjectType {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("invalid object: {0}")]
    InvalidObject(String),

    #[error("ref {0} not found")]
    RefNotFound(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("ambiguous argument '{name}': candidates are {}", candidates.join(", "))]
    AmbiguousReference {
        name: String,
        candidates: Vec<String>,
    },

    #[error("unresolved merge conflicts in: {}", paths.join(", "))]
    MergeConflict { paths: Vec<String> },

    #[error("invalid tree entry: {0}")]
    InvalidTreeEntry(String),

    #[error("corrupt index file: {0}")]
    CorruptIndex(String),

    #[error("cannot update {name}: {remote} is not an ancestor of {local}")]
    NonFastForward {
        name: String,
        local: ObjectId,
        remote: ObjectId,
    },

    #[error("I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach a path to a bare `std::io::Error`.
pub trait IoContext<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::io(path, source))
    }
}
