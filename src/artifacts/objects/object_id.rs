//! Object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character lowercase hexadecimal strings. They address every
//! object in the store (blobs, trees, commits).
//!
//! ## Storage
//!
//! Objects live in `.kit/objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_BYTES, OBJECT_ID_LENGTH};
use crate::errors::{Error, Result};
use std::io;
use std::path::PathBuf;

/// Object identifier (SHA-1 hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Upper-case digits are folded to lower case so that `ABC...` and `abc...`
    /// address the same object.
    pub fn try_parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.len() != OBJECT_ID_LENGTH {
            return Err(Error::InvalidObject(format!(
                "invalid object ID length {}: {}",
                id.len(),
                id
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidObject(format!(
                "invalid object ID characters: {id}"
            )));
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Build an object ID from a raw digest
    pub fn from_digest(digest: &[u8]) -> Result<Self> {
        if digest.len() != OBJECT_ID_BYTES {
            return Err(Error::InvalidObject(format!(
                "invalid digest length: {}",
                digest.len()
            )));
        }

        Self::try_parse(digest.iter().map(|b| format!("{b:02x}")).collect::<String>())
    }

    /// Write the object ID in binary format (20 bytes)
    ///
    /// Used when serializing tree objects and index entries.
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        let hex40 = self.as_ref();

        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex40[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an object ID from binary format (20 bytes)
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut buffer = [0u8; OBJECT_ID_BYTES];
        reader.read_exact(&mut buffer)?;

        let hex40 = buffer
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>();

        Ok(Self(hex40))
    }

    /// Convert to the fan-out storage path `XX/YYYY...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_short_ids() {
        assert!(ObjectId::try_parse("abc123").is_err());
    }

    #[test]
    fn rejects_non_hex_ids() {
        assert!(ObjectId::try_parse("z".repeat(40)).is_err());
    }

    #[test]
    fn folds_upper_case() {
        let oid = ObjectId::try_parse("A".repeat(40)).unwrap();
        assert_eq!(oid.as_ref(), "a".repeat(40));
    }

    #[test]
    fn splits_storage_path() {
        let oid = ObjectId::try_parse(format!("ab{}", "c".repeat(38))).unwrap();
        assert_eq!(oid.to_path(), PathBuf::from("ab").join("c".repeat(38)));
        assert_eq!(oid.to_short_oid(), "abccccc");
    }

    proptest! {
        #[test]
        fn binary_form_preserves_id(hex in "[0-9a-f]{40}") {
            let oid = ObjectId::try_parse(hex).unwrap();
            let mut buffer = Vec::new();
            oid.write_h40_to(&mut buffer).unwrap();
            prop_assert_eq!(buffer.len(), OBJECT_ID_BYTES);

            let decoded = ObjectId::read_h40_from(&mut buffer.as_slice()).unwrap();
            prop_assert_eq!(decoded, oid);
        }
    }
}
