use crate::areas::repository::Repository;

impl Repository {
    pub fn write_tree_command(&self) -> anyhow::Result<()> {
        let oid = self.write_tree()?;
        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }
}
