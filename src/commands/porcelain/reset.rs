use crate::areas::repository::Repository;

impl Repository {
    /// Point the current branch (or detached HEAD) at `revision` and reload the
    /// index from it; the working tree is left as it is
    pub fn reset(&self, revision: &str) -> anyhow::Result<()> {
        let target = self.resolve_revision(revision)?;
        let commit = self.database().load_commit(&target)?;
        let staged = self.get_tree(&target)?;

        self.update_index(|index| {
            index.replace(&staged);
            Ok(())
        })?;
        self.refs().update_head(&target)?;
        self.clear_merge()?;

        writeln!(
            self.writer(),
            "HEAD is now at {} {}",
            target.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }
}
