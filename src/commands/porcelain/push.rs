use crate::areas::repository::Repository;
use std::path::Path;

impl Repository {
    pub fn push_command(&self, remote_path: &Path, branch: &str) -> anyhow::Result<()> {
        let pushed = self.push(remote_path, branch)?;

        writeln!(self.writer(), "To {}", remote_path.display())?;
        writeln!(self.writer(), " * {} -> {branch}", pushed.to_short_oid())?;

        Ok(())
    }
}
