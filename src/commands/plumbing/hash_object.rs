use crate::areas::repository::Repository;
use crate::artifacts::objects::object::hash_object;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use std::path::Path;

impl Repository {
    pub fn hash_object(&self, file: &Path, write: bool) -> anyhow::Result<()> {
        let content = std::fs::read(file)
            .with_context(|| format!("could not read {}", file.display()))?;

        let oid = if write {
            self.database().put(ObjectType::Blob, &content)?
        } else {
            hash_object(ObjectType::Blob, &content)?
        };

        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }
}
