use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    pub fn commit(&self, message: &str) -> anyhow::Result<ObjectId> {
        let message = message.trim();
        if message.is_empty() {
            anyhow::bail!("aborting commit due to empty commit message");
        }

        let oid = self.commit_index(&format!("{message}\n"))?;
        let commit = self.database().load_commit(&oid)?;

        let branch = match self.refs().current_branch()? {
            Some(branch) => branch.short_name().to_string(),
            None => "detached HEAD".to_string(),
        };
        let root = if commit.parents().is_empty() { " (root-commit)" } else { "" };

        writeln!(
            self.writer(),
            "[{branch}{root} {}] {}",
            oid.to_short_oid(),
            commit.short_message()
        )?;

        Ok(oid)
    }
}
