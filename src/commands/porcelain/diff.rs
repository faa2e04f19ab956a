use crate::areas::repository::Repository;
use crate::artifacts::diff::diff_target::{ContentSource, DiffTarget};
use crate::artifacts::diff::line_diff::{Edit, Hunk, LineDiff, line_diff};
use crate::artifacts::diff::tree_diff::{Change, ChangeKind, DiffFilter, diff_trees};
use colored::Colorize;

#[derive(Debug, Clone, Copy)]
pub struct DiffOptions {
    /// Compare against the index instead of the working tree
    pub cached: bool,
    /// Print `<code>\t<path>` per change instead of patches
    pub name_status: bool,
    /// Only show changes of these kinds
    pub filter: DiffFilter,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            cached: false,
            name_status: false,
            filter: DiffFilter::all(),
        }
    }
}

impl Repository {
    /// Line diffs between two states of the repository
    ///
    /// - default: index vs working tree
    /// - `cached`: `revision` (HEAD by default) vs index
    /// - `revision` alone: that commit vs working tree
    ///
    /// # Arguments
    ///
    /// * `revision` - Commit to compare from; HEAD for `cached` when `None`
    /// * `opts` - Output format and the kinds of change to show
    pub fn diff(&self, revision: Option<&str>, opts: &DiffOptions) -> anyhow::Result<()> {
        let base = match revision {
            Some(revision) => Some(self.get_tree(&self.resolve_revision(revision)?)?),
            None => None,
        };

        let (old_tree, old_source, new_tree, new_source) = if opts.cached {
            let old_tree = match base {
                Some(tree) => tree,
                None => self.get_head_tree()?,
            };
            (
                old_tree,
                ContentSource::Database(self.database()),
                self.get_index_tree()?,
                ContentSource::Database(self.database()),
            )
        } else {
            let index_tree = self.get_index_tree()?;
            let working_tree = self.get_working_tree()?;
            // untracked files only show up against a commit
            let new_tree = match base {
                Some(_) => working_tree,
                None => working_tree
                    .into_iter()
                    .filter(|(path, _)| index_tree.contains_key(path))
                    .collect(),
            };
            (
                base.unwrap_or(index_tree),
                ContentSource::Database(self.database()),
                new_tree,
                ContentSource::Workspace(self.workspace()),
            )
        };

        let changes = diff_trees(&old_tree, &new_tree)
            .into_iter()
            .filter(|change| change.matches_filter(opts.filter));

        for change in changes {
            if opts.name_status {
                writeln!(self.writer(), "{}\t{}", change.kind.code(), change.path)?;
                continue;
            }

            let a = DiffTarget::load(&change.path, change.old_oid.as_ref(), old_source)?;
            let b = DiffTarget::load(&change.path, change.new_oid.as_ref(), new_source)?;
            self.print_diff(&change, &a, &b)?;
        }

        Ok(())
    }

    fn print_diff(&self, change: &Change, a: &DiffTarget, b: &DiffTarget) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}",
            format!("diff --kit a/{} b/{}", change.path, change.path).bold()
        )?;
        match change.kind {
            ChangeKind::Added => writeln!(self.writer(), "{}", "new file".bold())?,
            ChangeKind::Removed => writeln!(self.writer(), "{}", "deleted file".bold())?,
            ChangeKind::Modified => {}
        }
        writeln!(
            self.writer(),
            "{}",
            format!("index {}..{}", a.short_oid(), b.short_oid()).bold()
        )?;

        match line_diff(&a.content, &b.content) {
            LineDiff::Binary => {
                writeln!(
                    self.writer(),
                    "Binary files {} and {} differ",
                    a.diff_path("a"),
                    b.diff_path("b")
                )?;
            }
            LineDiff::Text(hunks) => {
                writeln!(self.writer(), "{}", format!("--- {}", a.diff_path("a")).bold())?;
                writeln!(self.writer(), "{}", format!("+++ {}", b.diff_path("b")).bold())?;
                for hunk in &hunks {
                    self.print_diff_hunk(hunk)?;
                }
            }
        }

        Ok(())
    }

    fn print_diff_hunk(&self, hunk: &Hunk) -> anyhow::Result<()> {
        writeln!(self.writer(), "{}", hunk.header().cyan())?;

        for edit in hunk.edits() {
            let line = edit.to_string();
            match edit {
                Edit::Added(_) => writeln!(self.writer(), "{}", line.green())?,
                Edit::Removed(_) => writeln!(self.writer(), "{}", line.red())?,
                Edit::Context(_) => writeln!(self.writer(), "{line}")?,
            }
        }

        Ok(())
    }
}
