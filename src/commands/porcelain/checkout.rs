use crate::areas::repository::Repository;
use crate::artifacts::branch::ref_name::RefName;

impl Repository {
    /// Switch to a branch (attached HEAD) or any other revision (detached HEAD)
    ///
    /// Tracked files are replaced by the target's tree; untracked files stay.
    pub fn checkout(&self, revision: &str) -> anyhow::Result<()> {
        if self.merge_state().is_active() || self.refs().read_merge_head()?.is_some() {
            anyhow::bail!("you need to resolve your current merge first");
        }

        let target = self.resolve_revision(revision)?;
        let commit = self.database().load_commit(&target)?;

        let branch = RefName::branch(revision)
            .ok()
            .filter(|branch| self.refs().exists(branch));

        self.read_tree(commit.tree_oid())?;

        match branch {
            Some(branch) => {
                self.refs().attach_head(&branch)?;
                writeln!(self.writer(), "Switched to branch '{revision}'")?;
            }
            None => {
                self.refs().detach_head(&target)?;
                writeln!(
                    self.writer(),
                    "HEAD is now at {} {}",
                    target.to_short_oid(),
                    commit.short_message()
                )?;
            }
        }

        Ok(())
    }
}
