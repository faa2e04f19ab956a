use crate::areas::repository::Repository;
use anyhow::Context;

impl Repository {
    pub fn init(&self) -> anyhow::Result<()> {
        let created = self
            .initialize()
            .context("Failed to create the repository layout")?;

        let verb = if created { "Initialized empty" } else { "Reinitialized existing" };
        writeln!(
            self.writer(),
            "{verb} kit repository in {}",
            self.kit_dir().display()
        )?;

        Ok(())
    }
}
