use crate::areas::repository::Repository;
use crate::artifacts::objects::object::{Object, ObjectBox};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatFileMode {
    /// Print the content
    Pretty,
    /// Print the object kind
    Type,
}

impl Repository {
    pub fn cat_file(&self, revision: &str, mode: CatFileMode) -> anyhow::Result<()> {
        let oid = self.resolve_revision(revision)?;

        match mode {
            CatFileMode::Type => {
                let kind = self.database().get_object_type(&oid)?;
                writeln!(self.writer(), "{kind}")?;
            }
            CatFileMode::Pretty => match self.database().parse_object(&oid)? {
                ObjectBox::Blob(blob) => self.writer().write_all(blob.content())?,
                ObjectBox::Tree(tree) if tree.is_empty() => {}
                ObjectBox::Tree(tree) => writeln!(self.writer(), "{}", tree.display())?,
                ObjectBox::Commit(_) => {
                    let raw = self.database().get(&oid)?;
                    self.writer().write_all(&raw.payload)?;
                }
            },
        }

        Ok(())
    }
}
