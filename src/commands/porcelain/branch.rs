use crate::areas::repository::Repository;
use crate::artifacts::branch::ref_name::RefName;
use anyhow::Context;
use colored::Colorize;

impl Repository {
    /// Create `name` at `start` (HEAD by default)
    pub fn branch(&self, name: &str, start: Option<&str>) -> anyhow::Result<()> {
        let branch = RefName::branch(name)?;

        let start_oid = match start {
            Some(start) => self.resolve_revision(start)?,
            None => self
                .refs()
                .read_head()?
                .ok_or_else(|| anyhow::anyhow!("not a valid object name: '{}'", self.config().default_branch))?,
        };
        // branches only ever point at commits
        self.database().load_commit(&start_oid)?;

        self.refs()
            .create_ref(&branch, &start_oid)
            .with_context(|| format!("cannot create branch '{name}'"))?;

        Ok(())
    }

    pub fn list_branches(&self) -> anyhow::Result<()> {
        let current = self.refs().current_branch()?;

        if current.is_none()
            && let Some(head) = self.refs().read_head()?
        {
            let detached = format!("(HEAD detached at {})", head.to_short_oid());
            writeln!(self.writer(), "* {}", detached.green())?;
        }

        for (branch, _) in self.refs().list_branches()? {
            if current.as_ref() == Some(&branch) {
                writeln!(self.writer(), "* {}", branch.short_name().green())?;
            } else {
                writeln!(self.writer(), "  {}", branch.short_name())?;
            }
        }

        Ok(())
    }

    pub fn delete_branch(&self, name: &str) -> anyhow::Result<()> {
        let branch = RefName::branch(name)?;
        if self.refs().is_current_branch(&branch)? {
            anyhow::bail!("cannot delete branch '{name}' checked out at '{}'", self.path().display());
        }

        let oid = self.refs().resolve(&branch)?;
        self.refs().delete_ref(&branch, false)?;

        writeln!(self.writer(), "Deleted branch {name} (was {}).", oid.to_short_oid())?;

        Ok(())
    }
}
