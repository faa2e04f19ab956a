use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::to_repo_path;
use anyhow::Context;
use std::path::{Component, Path, PathBuf};

impl Repository {
    /// Stage files and directories given relative to the current directory
    pub fn add(&self, paths: &[String]) -> anyhow::Result<()> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        let paths = paths
            .iter()
            .map(|path| self.repository_path(&cwd, path))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let staged = self.stage_paths(&paths)?;
        tracing::debug!(staged = staged.len(), "added paths");

        for path in paths.iter().filter(|path| !path.is_empty()) {
            let known = staged
                .iter()
                .any(|staged| staged == path || staged.starts_with(&format!("{path}/")));
            if !known {
                eprintln!("warning: pathspec '{path}' did not match any files");
            }
        }

        Ok(())
    }

    /// `path` relative to the repository root, `""` for the root itself
    pub(crate) fn repository_path(&self, cwd: &Path, path: &str) -> anyhow::Result<String> {
        let absolute = normalize(&cwd.canonicalize()?.join(path));
        let relative = absolute
            .strip_prefix(self.path())
            .with_context(|| format!("'{path}' is outside the repository"))?;

        if relative.as_os_str().is_empty() {
            return Ok(String::new());
        }

        Ok(to_repo_path(relative)?)
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("/repo/./a/../b.txt", "/repo/b.txt")]
    #[case("/repo/a/b/..", "/repo/a")]
    #[case("/repo", "/repo")]
    fn normalize_resolves_relative_components(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(normalize(Path::new(path)), PathBuf::from(expected));
    }
}
