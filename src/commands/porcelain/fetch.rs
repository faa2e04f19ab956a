use crate::areas::repository::Repository;
use std::path::Path;

impl Repository {
    pub fn fetch_command(&self, remote_path: &Path) -> anyhow::Result<()> {
        let updated = self.fetch(remote_path)?;

        writeln!(self.writer(), "From {}", remote_path.display())?;
        for (name, oid) in updated {
            writeln!(self.writer(), " * {} -> {}", oid.to_short_oid(), name.short_name())?;
        }

        Ok(())
    }
}
