use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};

/// Encode an object's payload (without the `<kind> <len>\0` header)
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Decode an object from its payload (header already stripped)
pub trait Unpackable {
    fn deserialize(payload: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    fn object_id(&self) -> Result<ObjectId> {
        let payload = self.serialize()?;
        hash_object(self.object_type(), &payload)
    }
}

/// Compute the OID of `(kind, payload)` without storing anything.
pub fn hash_object(kind: ObjectType, payload: &[u8]) -> Result<ObjectId> {
    let mut hasher = Sha1::new();
    hasher.update(kind.frame(payload));

    ObjectId::from_digest(&hasher.finalize())
}

pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_blob_matches_well_known_id() {
        // sha1("blob 0\0")
        let oid = hash_object(ObjectType::Blob, b"").unwrap();
        assert_eq!(oid.as_ref(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn kind_takes_part_in_the_id() {
        let blob = hash_object(ObjectType::Blob, b"payload").unwrap();
        let commit = hash_object(ObjectType::Commit, b"payload").unwrap();
        assert_ne!(blob, commit);
    }
}
