use crate::areas::repository::Repository;
use crate::artifacts::objects::object::ObjectBox;
use anyhow::bail;

impl Repository {
    /// Load a tree, or the tree of a commit, into the index and working tree
    pub fn read_tree_command(&self, revision: &str) -> anyhow::Result<()> {
        let oid = self.resolve_revision(revision)?;

        let tree_oid = match self.database().parse_object(&oid)? {
            ObjectBox::Tree(_) => oid,
            ObjectBox::Commit(commit) => commit.tree_oid().clone(),
            ObjectBox::Blob(_) => bail!("{revision} is a blob, not a tree"),
        };

        self.read_tree(&tree_oid)?;

        Ok(())
    }
}
