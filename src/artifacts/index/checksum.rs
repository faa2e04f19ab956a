//! SHA-1 trailer for the index file
//!
//! Every byte read or written through [`Checksum`] is fed to a running digest.
//! The writer appends the digest; the reader compares it against the trailer.

use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::{Error, Result};
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

#[derive(Debug)]
pub struct Checksum<S> {
    stream: S,
    digest: Sha1,
}

impl<S> Checksum<S> {
    pub(crate) fn new(stream: S) -> Self {
        Checksum {
            stream,
            digest: Sha1::new(),
        }
    }
}

impl<S: Read> Checksum<S> {
    pub(crate) fn read(&mut self, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0; size];
        self.stream
            .read_exact(&mut buffer)
            .map_err(|_| Error::CorruptIndex("unexpected end-of-file".to_string()))?;

        self.digest.update(&buffer);
        Ok(buffer)
    }

    pub(crate) fn verify(&mut self) -> Result<()> {
        let mut expected = [0u8; CHECKSUM_SIZE];
        self.stream
            .read_exact(&mut expected)
            .map_err(|_| Error::CorruptIndex("missing checksum".to_string()))?;

        let actual = self.digest.clone().finalize();
        if expected != actual.as_slice() {
            return Err(Error::CorruptIndex(
                "checksum does not match value stored on disk".to_string(),
            ));
        }

        Ok(())
    }
}

impl<S: Write> Checksum<S> {
    pub(crate) fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    pub(crate) fn write_checksum(&mut self) -> std::io::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.stream.write_all(checksum.as_slice())
    }
}
