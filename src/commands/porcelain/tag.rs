use crate::areas::repository::Repository;
use crate::artifacts::branch::ref_name::RefName;
use anyhow::Context;

impl Repository {
    /// Create a lightweight tag at `revision` (HEAD by default); never overwrites
    pub fn tag(&self, name: &str, revision: Option<&str>) -> anyhow::Result<()> {
        let tag = RefName::tag(name)?;
        let oid = self.resolve_revision(revision.unwrap_or("HEAD"))?;

        self.refs()
            .create_ref(&tag, &oid)
            .with_context(|| format!("cannot create tag '{name}'"))?;

        Ok(())
    }

    pub fn list_tags(&self) -> anyhow::Result<()> {
        for (tag, _) in self.refs().list_tags()? {
            writeln!(self.writer(), "{}", tag.short_name())?;
        }

        Ok(())
    }
}
