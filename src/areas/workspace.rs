//! Working tree access
//!
//! Paths handed in and out are repository paths: slash separated and relative
//! to the root. Which paths are skipped is decided by the injected ignore
//! predicate, never by the workspace itself.

use crate::artifacts::index::index_entry::to_repo_path;
use crate::artifacts::objects::object::hash_object;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::tree::FlatTree;
use crate::config::IgnorePredicate;
use crate::errors::{IoContext, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct Workspace {
    path: Box<Path>,
    ignore: IgnorePredicate,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace").field("path", &self.path).finish()
    }
}

impl Workspace {
    pub fn new(path: Box<Path>, ignore: IgnorePredicate) -> Self {
        Workspace { path, ignore }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.path.join(path)
    }

    fn relative<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        path.strip_prefix(self.path.as_ref()).ok()
    }

    /// Every file under the root that the ignore predicate lets through, sorted
    pub fn list_files(&self) -> Result<Vec<String>> {
        let walker = WalkDir::new(&self.path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                self.relative(entry.path())
                    .is_none_or(|relative| relative.as_os_str().is_empty() || !(self.ignore)(relative))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.path.to_path_buf());
                crate::errors::Error::io(path, std::io::Error::other(e.to_string()))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(relative) = self.relative(entry.path()) {
                files.push(to_repo_path(relative)?);
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }

    pub fn read_file(&self, path: &str) -> Result<Bytes> {
        let full_path = self.full_path(path);
        std::fs::read(&full_path).map(Bytes::from).at(full_path)
    }

    /// Write `content` at `path`, replacing whatever file or directory is in the way
    pub fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        // a file where a parent directory should be
        let mut ancestor = self.path.to_path_buf();
        for component in Path::new(path).parent().into_iter().flat_map(Path::components) {
            ancestor.push(component);
            if ancestor.is_file() {
                std::fs::remove_file(&ancestor).at(&ancestor)?;
            }
        }
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).at(parent)?;
        }

        if full_path.is_dir() {
            std::fs::remove_dir_all(&full_path).at(&full_path)?;
        }

        std::fs::write(&full_path, content).at(&full_path)?;
        tracing::trace!(%path, size = content.len(), "wrote working tree file");

        Ok(())
    }

    /// Remove a file and any directories it leaves empty; a missing file is fine
    pub fn remove_file(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        if !full_path.is_file() {
            return Ok(());
        }

        std::fs::remove_file(&full_path).at(&full_path)?;
        self.prune_empty_dirs(&full_path)?;
        tracing::trace!(%path, "removed working tree file");

        Ok(())
    }

    fn prune_empty_dirs(&self, removed: &Path) -> Result<()> {
        let mut dir = removed.parent();

        while let Some(current) = dir {
            if current == self.path.as_ref() || !current.starts_with(&self.path) {
                break;
            }
            let is_empty = std::fs::read_dir(current).at(current)?.next().is_none();
            if !is_empty {
                break;
            }
            std::fs::remove_dir(current).at(current)?;
            dir = current.parent();
        }

        Ok(())
    }

    /// Blob OIDs of every working-tree file, computed without storing anything
    pub fn hash_files(&self) -> Result<FlatTree> {
        self.list_files()?
            .into_iter()
            .map(|path| {
                let content = self.read_file(&path)?;
                let oid = hash_object(ObjectType::Blob, &content)?;
                Ok((path, oid))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_ignore;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    #[fixture]
    fn workspace() -> (TempDir, Workspace) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let workspace = Workspace::new(dir.path().to_path_buf().into_boxed_path(), Arc::new(default_ignore));
        (dir, workspace)
    }

    #[rstest]
    fn lists_nested_files_and_skips_ignored_ones(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        dir.child("b.txt").write_str("b").unwrap();
        dir.child("a/nested/c.txt").write_str("c").unwrap();
        dir.child(".kit/HEAD").write_str("ref: refs/heads/master").unwrap();
        dir.child(".git/config").write_str("").unwrap();

        assert_eq!(workspace.list_files().unwrap(), vec!["a/nested/c.txt", "b.txt"]);
    }

    #[rstest]
    fn writing_through_a_file_replaces_it_with_a_directory(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        dir.child("a").write_str("file").unwrap();

        workspace.write_file("a/b.txt", b"nested").unwrap();

        dir.child("a/b.txt").assert("nested");
    }

    #[rstest]
    fn writing_over_a_directory_replaces_it_with_a_file(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        dir.child("a/b.txt").write_str("nested").unwrap();

        workspace.write_file("a", b"file").unwrap();

        dir.child("a").assert("file");
    }

    #[rstest]
    fn removing_the_last_file_prunes_its_directories(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        dir.child("a/b/c.txt").write_str("c").unwrap();
        dir.child("keep.txt").write_str("k").unwrap();

        workspace.remove_file("a/b/c.txt").unwrap();

        dir.child("a").assert(predicates::path::missing());
        dir.child("keep.txt").assert(predicates::path::exists());
    }

    #[rstest]
    fn hashing_files_writes_nothing(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        dir.child("f.txt").write_str("hello\n").unwrap();

        let hashed = workspace.hash_files().unwrap();

        assert_eq!(
            hashed["f.txt"],
            hash_object(ObjectType::Blob, b"hello\n").unwrap()
        );
        dir.child(".kit").assert(predicates::path::missing());
    }
}
