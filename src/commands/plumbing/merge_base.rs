use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Print the merge base; `None` for unrelated histories
    pub fn merge_base_command(&self, a: &str, b: &str) -> anyhow::Result<Option<ObjectId>> {
        let a = self.resolve_revision(a)?;
        let b = self.resolve_revision(b)?;

        let base = self.merge_base(&a, &b)?;
        if let Some(base) = &base {
            writeln!(self.writer(), "{base}")?;
        }

        Ok(base)
    }
}
