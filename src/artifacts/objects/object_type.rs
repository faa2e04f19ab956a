use crate::errors::{Error, Result};
use bytes::Bytes;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Prepend the `<kind> <len>\0` header to a payload.
    ///
    /// The framed bytes are what gets hashed and what gets stored.
    pub fn frame(&self, payload: &[u8]) -> Bytes {
        let header = format!("{} {}\0", self.as_str(), payload.len());
        let mut framed = Vec::with_capacity(header.len() + payload.len());
        framed.extend_from_slice(header.as_bytes());
        framed.extend_from_slice(payload);

        Bytes::from(framed)
    }

    /// Read the `<kind> <len>\0` header, leaving the reader at the payload.
    ///
    /// Returns the kind and the declared payload length.
    pub fn parse_header(data_reader: &mut impl BufRead) -> Result<(ObjectType, usize)> {
        let mut object_type = Vec::new();
        data_reader
            .read_until(b' ', &mut object_type)
            .map_err(|e| Error::InvalidObject(e.to_string()))?;
        if object_type.pop() != Some(b' ') {
            return Err(Error::InvalidObject("missing object kind".to_string()));
        }

        let object_type = std::str::from_utf8(&object_type)
            .map_err(|_| Error::InvalidObject("non UTF-8 object kind".to_string()))?;
        let object_type = ObjectType::try_from(object_type)?;

        let mut size = Vec::new();
        data_reader
            .read_until(b'\0', &mut size)
            .map_err(|e| Error::InvalidObject(e.to_string()))?;
        if size.pop() != Some(b'\0') {
            return Err(Error::InvalidObject("missing object size".to_string()));
        }

        let size = std::str::from_utf8(&size)
            .ok()
            .and_then(|size| size.parse::<usize>().ok())
            .ok_or_else(|| Error::InvalidObject("invalid object size".to_string()))?;

        Ok((object_type, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            _ => Err(Error::InvalidObject(format!("unknown object kind {value}"))),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
