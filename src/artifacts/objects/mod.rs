//! Object types and operations
//!
//! All content is stored as immutable objects identified by SHA-1 hashes:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (names, kinds, and object IDs)
//! - **Commit**: Snapshot with metadata (author, message, parent commits, tree)
//!
//! All objects are hashed and stored in the framed format
//! `<type> <size>\0<content>`

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a raw SHA-1 digest
pub const OBJECT_ID_BYTES: usize = 20;
