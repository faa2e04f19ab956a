//! References (branches, tags, HEAD)
//!
//! References are human-readable names pointing at objects. They can be:
//! - Direct: the file holds a 40-character object ID
//! - Symbolic: the file holds `ref: <name>` (e.g. HEAD -> refs/heads/master)
//!
//! ## Namespaces
//!
//! - `HEAD`: the current branch (attached) or commit (detached)
//! - `MERGE_HEAD`: the other side of a merge waiting on conflict resolution
//! - `refs/heads/*`: branch tips
//! - `refs/tags/*`: lightweight tags
//! - `refs/remote/*`: branch tips copied in by fetch

use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::branch::{HEADS_PREFIX, TAGS_PREFIX};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, IoContext, Result};
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Longest chain of symbolic refs followed before giving up
pub const MAX_SYMREF_DEPTH: usize = 8;

const SYMREF_PREFIX: &str = "ref: ";

/// What a ref file holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    Direct(ObjectId),
    Symbolic(RefName),
}

impl RefValue {
    fn parse(content: &str) -> Result<Self> {
        match content.strip_prefix(SYMREF_PREFIX) {
            Some(target) => Ok(RefValue::Symbolic(RefName::try_parse(target.trim())?)),
            None => Ok(RefValue::Direct(ObjectId::try_parse(content)?)),
        }
    }

    fn render(&self) -> String {
        match self {
            RefValue::Direct(oid) => oid.to_string(),
            RefValue::Symbolic(target) => format!("{SYMREF_PREFIX}{target}"),
        }
    }
}

impl std::fmt::Display for RefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Ref store rooted at the repository directory (`.kit`)
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

impl Refs {
    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.path.join(name.as_ref_path())
    }

    /// Read a ref file as-is, without following symbolic refs
    pub fn read_ref(&self, name: &RefName) -> Result<Option<RefValue>> {
        let path = self.ref_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).at(&path)?;
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        RefValue::parse(content).map(Some)
    }

    /// The last ref of the symbolic chain starting at `name`
    ///
    /// The returned ref may not exist yet (HEAD on an unborn branch).
    pub fn final_ref(&self, name: &RefName) -> Result<RefName> {
        let mut current = name.clone();

        for _ in 0..=MAX_SYMREF_DEPTH {
            match self.read_ref(&current)? {
                Some(RefValue::Symbolic(target)) => current = target,
                _ => return Ok(current),
            }
        }

        Err(Error::InvalidRefName(format!(
            "symbolic ref chain from {name} is longer than {MAX_SYMREF_DEPTH}"
        )))
    }

    /// Follow `name` to an object ID, `None` if the chain ends at a missing ref
    pub fn try_resolve(&self, name: &RefName) -> Result<Option<ObjectId>> {
        let target = self.final_ref(name)?;

        match self.read_ref(&target)? {
            Some(RefValue::Direct(oid)) => Ok(Some(oid)),
            _ => Ok(None),
        }
    }

    /// Follow `name` to the object ID it finally names
    ///
    /// # Arguments
    ///
    /// * `name` - Ref to start from, such as `HEAD` or `refs/heads/master`
    ///
    /// # Errors
    ///
    /// `RefNotFound` when the chain ends at a missing ref.
    pub fn resolve(&self, name: &RefName) -> Result<ObjectId> {
        self.try_resolve(name)?
            .ok_or_else(|| Error::RefNotFound(name.to_string()))
    }

    pub fn exists(&self, name: &RefName) -> bool {
        self.ref_path(name).is_file()
    }

    /// Create or move a ref
    ///
    /// # Arguments
    ///
    /// * `name` - Ref to write
    /// * `value` - Object ID or symbolic target to store
    /// * `deref` - Write to the last ref of the symbolic chain instead of `name`
    pub fn update_ref(&self, name: &RefName, value: &RefValue, deref: bool) -> Result<()> {
        let target = if deref {
            self.final_ref(name)?
        } else {
            name.clone()
        };

        self.write_ref_file(&self.ref_path(&target), &value.render())?;
        tracing::debug!(name = %target, value = %value, "updated ref");

        Ok(())
    }

    /// Remove a ref file and any directories it leaves empty
    ///
    /// # Arguments
    ///
    /// * `name` - Ref to delete
    /// * `deref` - Delete the last ref of the symbolic chain instead of `name`
    ///
    /// # Errors
    ///
    /// `RefNotFound` when there is no such ref file.
    pub fn delete_ref(&self, name: &RefName, deref: bool) -> Result<()> {
        let target = if deref {
            self.final_ref(name)?
        } else {
            name.clone()
        };
        let path = self.ref_path(&target);

        if !path.is_file() {
            return Err(Error::RefNotFound(target.to_string()));
        }

        std::fs::remove_file(&path).at(&path)?;
        self.prune_empty_parent_dirs(&path)?;
        tracing::debug!(name = %target, "deleted ref");

        Ok(())
    }

    /// Every ref under `prefix` that resolves to an object, sorted by name
    ///
    /// # Arguments
    ///
    /// * `prefix` - Namespace such as `refs/heads/`; empty lists everything
    ///
    /// # Returns
    ///
    /// `(name, oid)` pairs. `HEAD` is included when the prefix is empty, and
    /// refs whose chain ends at a missing ref are left out.
    pub fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, ObjectId)>> {
        let mut names = Vec::new();
        if prefix.is_empty() || "HEAD".starts_with(prefix) {
            names.push(RefName::head());
        }

        let refs_path = self.path.join("refs");
        for entry in WalkDir::new(&refs_path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.io_error().map(|e| e.kind()) == Some(std::io::ErrorKind::NotFound) => {
                    continue;
                }
                Err(e) => {
                    let path = e.path().map(PathBuf::from).unwrap_or_default();
                    return Err(Error::io(path, std::io::Error::other(e.to_string())));
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.path) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if name.starts_with(prefix)
                && let Ok(name) = RefName::try_parse(&name)
            {
                names.push(name);
            }
        }

        let mut refs = Vec::new();
        for name in names {
            if let Some(oid) = self.try_resolve(&name)? {
                refs.push((name, oid));
            }
        }

        Ok(refs)
    }

    pub fn list_branches(&self) -> Result<Vec<(RefName, ObjectId)>> {
        self.list_refs(HEADS_PREFIX)
    }

    pub fn list_tags(&self) -> Result<Vec<(RefName, ObjectId)>> {
        self.list_refs(TAGS_PREFIX)
    }

    /// The commit HEAD points at, `None` on an unborn branch
    pub fn read_head(&self) -> Result<Option<ObjectId>> {
        self.try_resolve(&RefName::head())
    }

    /// Move whatever HEAD points at (the current branch, or HEAD itself when detached)
    pub fn update_head(&self, oid: &ObjectId) -> Result<()> {
        self.update_ref(&RefName::head(), &RefValue::Direct(oid.clone()), true)
    }

    /// The branch HEAD is attached to, `None` when detached
    pub fn current_branch(&self) -> Result<Option<RefName>> {
        let target = self.final_ref(&RefName::head())?;

        Ok(target.is_branch().then_some(target))
    }

    /// Check if a branch is the one HEAD is attached to
    ///
    /// # Arguments
    ///
    /// * `branch` - The branch to check
    ///
    /// # Returns
    ///
    /// true if the branch is current, false otherwise (including detached HEAD)
    pub fn is_current_branch(&self, branch: &RefName) -> Result<bool> {
        Ok(self.current_branch()?.as_ref() == Some(branch))
    }

    /// Attach HEAD to a branch
    pub fn attach_head(&self, branch: &RefName) -> Result<()> {
        self.update_ref(&RefName::head(), &RefValue::Symbolic(branch.clone()), false)
    }

    /// Point HEAD straight at a commit
    pub fn detach_head(&self, oid: &ObjectId) -> Result<()> {
        self.update_ref(&RefName::head(), &RefValue::Direct(oid.clone()), false)
    }

    pub fn read_merge_head(&self) -> Result<Option<ObjectId>> {
        self.try_resolve(&RefName::merge_head())
    }

    pub fn set_merge_head(&self, oid: &ObjectId) -> Result<()> {
        self.update_ref(&RefName::merge_head(), &RefValue::Direct(oid.clone()), false)
    }

    pub fn clear_merge_head(&self) -> Result<()> {
        let merge_head = RefName::merge_head();
        if self.exists(&merge_head) {
            self.delete_ref(&merge_head, false)?;
        }

        Ok(())
    }

    /// Create `name` at `oid`, refusing to overwrite an existing ref
    ///
    /// # Arguments
    ///
    /// * `name` - Full name of the new ref
    /// * `oid` - Object the ref will point at
    ///
    /// # Errors
    ///
    /// `InvalidRefName` when a ref of that name already exists.
    pub fn create_ref(&self, name: &RefName, oid: &ObjectId) -> Result<()> {
        if self.exists(name) {
            return Err(Error::InvalidRefName(format!("{name} already exists")));
        }

        self.update_ref(name, &RefValue::Direct(oid.clone()), false)
    }

    fn write_ref_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).at(parent)?;
        }

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .at(path)?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1).at(path)?;
        lock.write_all(content.as_bytes()).at(path)?;

        Ok(())
    }

    fn prune_empty_parent_dirs(&self, path: &Path) -> Result<()> {
        let refs_path = self.path.join("refs");
        let mut current = path.parent();

        while let Some(parent) = current {
            if parent == refs_path || parent == self.path.as_ref() || !parent.starts_with(&refs_path) {
                break;
            }
            if parent.read_dir().at(parent)?.next().is_some() {
                break;
            }

            std::fs::remove_dir(parent).at(parent)?;
            current = parent.parent();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object::hash_object;
    use crate::artifacts::objects::object_type::ObjectType;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn refs() -> (TempDir, Refs) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let refs = Refs::new(dir.path().to_path_buf().into_boxed_path());
        refs.attach_head(&RefName::branch("master").unwrap()).unwrap();
        (dir, refs)
    }

    fn oid(seed: &str) -> ObjectId {
        hash_object(ObjectType::Commit, seed.as_bytes()).unwrap()
    }

    #[rstest]
    fn unborn_branch_has_no_head(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;

        assert_eq!(refs.read_head().unwrap(), None);
        assert!(matches!(
            refs.resolve(&RefName::head()),
            Err(Error::RefNotFound(_))
        ));
    }

    #[rstest]
    fn deref_update_moves_the_branch(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        let master = RefName::branch("master").unwrap();

        refs.update_head(&oid("a")).unwrap();

        assert_eq!(refs.resolve(&master).unwrap(), oid("a"));
        assert_eq!(
            refs.read_ref(&RefName::head()).unwrap(),
            Some(RefValue::Symbolic(master.clone()))
        );
        assert_eq!(refs.current_branch().unwrap(), Some(master));
    }

    #[rstest]
    fn detached_head_is_not_a_branch(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        refs.detach_head(&oid("a")).unwrap();

        assert_eq!(refs.current_branch().unwrap(), None);
        assert_eq!(refs.read_head().unwrap(), Some(oid("a")));
    }

    #[rstest]
    fn symbolic_cycle_is_bounded(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        let a = RefName::branch("a").unwrap();
        let b = RefName::branch("b").unwrap();
        refs.update_ref(&a, &RefValue::Symbolic(b.clone()), false).unwrap();
        refs.update_ref(&b, &RefValue::Symbolic(a.clone()), false).unwrap();

        assert!(matches!(refs.resolve(&a), Err(Error::InvalidRefName(_))));
    }

    #[rstest]
    fn list_refs_filters_by_prefix(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        refs.update_head(&oid("a")).unwrap();
        refs.create_ref(&RefName::branch("topic/x").unwrap(), &oid("b"))
            .unwrap();
        refs.create_ref(&RefName::tag("v1").unwrap(), &oid("c"))
            .unwrap();

        let branches = refs
            .list_branches()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect::<Vec<_>>();
        assert_eq!(branches, vec!["refs/heads/master", "refs/heads/topic/x"]);

        let all = refs.list_refs("").unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], (RefName::head(), oid("a")));
    }

    #[rstest]
    fn create_ref_refuses_to_overwrite(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        let tag = RefName::tag("v1").unwrap();
        refs.create_ref(&tag, &oid("a")).unwrap();

        assert!(refs.create_ref(&tag, &oid("b")).is_err());
        assert_eq!(refs.resolve(&tag).unwrap(), oid("a"));
    }

    #[rstest]
    fn delete_prunes_empty_namespaces(refs: (TempDir, Refs)) {
        let (dir, refs) = refs;
        let branch = RefName::branch("feature/deep/x").unwrap();
        refs.create_ref(&branch, &oid("a")).unwrap();

        refs.delete_ref(&branch, false).unwrap();

        assert!(!dir.path().join("refs/heads/feature").exists());
        assert!(matches!(
            refs.delete_ref(&branch, false),
            Err(Error::RefNotFound(_))
        ));
    }
}
