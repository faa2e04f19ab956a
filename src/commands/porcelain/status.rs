use crate::areas::repository::Repository;
use crate::artifacts::diff::tree_diff::{Change, ChangeKind, diff_trees};
use crate::artifacts::tree::FlatTree;
use colored::{Color, Colorize};
use std::collections::BTreeSet;

// Terminology:
// - staged: HEAD tree vs index
// - unstaged: index vs working tree, for tracked paths only
// - untracked: working-tree files the index does not know about
// - unmerged: paths a conflicted merge left unresolved
impl Repository {
    pub fn status(&self) -> anyhow::Result<()> {
        let head_tree = self.get_head_tree()?;
        let index_tree = self.get_index_tree()?;
        let working_tree = self.get_working_tree()?;
        let unmerged = self.merge_state().conflicts()?;

        let staged = diff_trees(&head_tree, &index_tree)
            .into_iter()
            .filter(|change| !unmerged.contains(&change.path))
            .collect::<Vec<_>>();
        let unstaged = diff_trees(&index_tree, &working_tree)
            .into_iter()
            .filter(|change| change.kind != ChangeKind::Added && !unmerged.contains(&change.path))
            .collect::<Vec<_>>();
        let untracked = Self::untracked_entries(&index_tree, &working_tree);

        self.print_branch_state()?;

        if !unmerged.is_empty() {
            writeln!(self.writer(), "You have unmerged paths.")?;
            writeln!(self.writer(), "  (fix conflicts and run \"kit commit\")")?;
            writeln!(self.writer())?;
            let lines = unmerged.iter().map(|path| format!("both modified:   {path}"));
            self.print_section("Unmerged paths:", lines, Color::Red)?;
        }

        self.print_section("Changes to be committed:", staged.iter().map(Self::change_line), Color::Green)?;
        self.print_section(
            "Changes not staged for commit:",
            unstaged.iter().map(Self::change_line),
            Color::Red,
        )?;
        self.print_section("Untracked files:", untracked.iter().cloned(), Color::Red)?;

        if staged.is_empty() && unstaged.is_empty() && unmerged.is_empty() {
            if untracked.is_empty() {
                writeln!(self.writer(), "nothing to commit, working tree clean")?;
            } else {
                writeln!(self.writer(), "nothing added to commit but untracked files present")?;
            }
        }

        Ok(())
    }

    fn print_branch_state(&self) -> anyhow::Result<()> {
        match self.refs().current_branch()? {
            Some(branch) => writeln!(self.writer(), "On branch {}", branch.short_name())?,
            None => {
                let head = self.refs().read_head()?;
                let short = head.as_ref().map(|oid| oid.to_short_oid()).unwrap_or_default();
                writeln!(self.writer(), "HEAD detached at {short}")?;
            }
        }

        if self.refs().read_head()?.is_none() {
            writeln!(self.writer())?;
            writeln!(self.writer(), "No commits yet")?;
        }
        writeln!(self.writer())?;

        Ok(())
    }

    fn print_section(
        &self,
        title: &str,
        lines: impl IntoIterator<Item = String>,
        color: Color,
    ) -> anyhow::Result<()> {
        let mut lines = lines.into_iter().peekable();
        if lines.peek().is_none() {
            return Ok(());
        }

        writeln!(self.writer(), "{title}")?;
        for line in lines {
            writeln!(self.writer(), "\t{}", line.color(color))?;
        }
        writeln!(self.writer())?;

        Ok(())
    }

    fn change_line(change: &Change) -> String {
        format!("{}:   {}", change.kind.describe(), change.path)
    }

    /// Untracked files, collapsing a directory that holds nothing tracked into `dir/`
    fn untracked_entries(index_tree: &FlatTree, working_tree: &FlatTree) -> BTreeSet<String> {
        let holds_tracked = |dir: &str| {
            let prefix = format!("{dir}/");
            index_tree.keys().any(|path| path.starts_with(&prefix))
        };

        working_tree
            .keys()
            .filter(|path| !index_tree.contains_key(*path))
            .map(|path| {
                let mut end = 0;
                while let Some(offset) = path[end..].find('/') {
                    let dir = &path[..end + offset];
                    if !holds_tracked(dir) {
                        return format!("{dir}/");
                    }
                    end += offset + 1;
                }

                path.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::areas::repository::Repository;
    use crate::artifacts::objects::object::hash_object;
    use crate::artifacts::objects::object_type::ObjectType;
    use crate::artifacts::tree::FlatTree;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tree(paths: &[&str]) -> FlatTree {
        paths
            .iter()
            .map(|path| {
                let oid = hash_object(ObjectType::Blob, path.as_bytes()).unwrap();
                (path.to_string(), oid)
            })
            .collect()
    }

    #[rstest]
    #[case::top_level_file(&[], &["a.txt"], &["a.txt"])]
    #[case::whole_untracked_dir(&["a.txt"], &["a.txt", "new/x", "new/deep/y"], &["new/"])]
    #[case::inside_tracked_dir(&["src/lib.rs"], &["src/lib.rs", "src/new.rs"], &["src/new.rs"])]
    #[case::untracked_subdir_of_tracked_dir(
        &["src/lib.rs"],
        &["src/lib.rs", "src/gen/a.rs", "src/gen/b.rs"],
        &["src/gen/"]
    )]
    fn untracked_entries_collapse_directories(
        #[case] tracked: &[&str],
        #[case] files: &[&str],
        #[case] expected: &[&str],
    ) {
        let untracked = Repository::untracked_entries(&tree(tracked), &tree(files));

        assert_eq!(
            untracked.into_iter().collect::<Vec<_>>(),
            expected.iter().map(|s| s.to_string()).collect::<Vec<_>>()
        );
    }
}
