//! Unresolved paths of a conflicted merge
//!
//! Stored in `.kit/MERGE_CONFLICTS`, one path per line, next to `MERGE_HEAD`.
//! The file exists only while a conflicted merge is waiting to be committed.

use crate::errors::{IoContext, Result};
use derive_new::new;
use std::collections::BTreeSet;
use std::path::Path;

pub const MERGE_CONFLICTS_FILE: &str = "MERGE_CONFLICTS";

#[derive(Debug, new)]
pub struct MergeState {
    /// Path to `.kit/MERGE_CONFLICTS`
    path: Box<Path>,
}

impl MergeState {
    pub fn is_active(&self) -> bool {
        self.path.is_file()
    }

    /// Unresolved paths, empty when no merge is in progress
    pub fn conflicts(&self) -> Result<BTreeSet<String>> {
        if !self.path.is_file() {
            return Ok(BTreeSet::new());
        }

        let content = std::fs::read_to_string(&self.path).at(self.path.as_ref())?;
        Ok(content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn record(&self, paths: impl IntoIterator<Item = String>) -> Result<()> {
        let mut content = String::new();
        for path in paths.into_iter().collect::<BTreeSet<_>>() {
            content.push_str(&path);
            content.push('\n');
        }

        std::fs::write(&self.path, content).at(self.path.as_ref())
    }

    /// Mark `path` as resolved; returns whether it was unresolved
    pub fn resolve(&self, path: &str) -> Result<bool> {
        let mut conflicts = self.conflicts()?;
        if !conflicts.remove(path) {
            return Ok(false);
        }

        tracing::debug!(%path, remaining = conflicts.len(), "resolved conflict");
        self.record(conflicts)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.is_file() {
            std::fs::remove_file(&self.path).at(self.path.as_ref())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    fn merge_state(dir: &TempDir) -> MergeState {
        MergeState::new(dir.path().join(MERGE_CONFLICTS_FILE).into_boxed_path())
    }

    #[test]
    fn no_file_means_no_merge_in_progress() {
        let dir = TempDir::new().unwrap();
        let state = merge_state(&dir);

        assert!(!state.is_active());
        assert!(state.conflicts().unwrap().is_empty());
    }

    #[test]
    fn resolving_paths_shrinks_the_list() {
        let dir = TempDir::new().unwrap();
        let state = merge_state(&dir);
        state.record(["b".to_string(), "a/x".to_string()]).unwrap();

        assert!(state.resolve("b").unwrap());
        assert!(!state.resolve("b").unwrap());

        assert_eq!(
            state.conflicts().unwrap(),
            BTreeSet::from(["a/x".to_string()])
        );
        assert!(state.is_active());

        state.clear().unwrap();
        assert!(!state.is_active());
    }
}
