//! Repository handle
//!
//! A [`Repository`] owns every storage area of one repository (objects, index,
//! refs, working tree, merge state) plus its [`Config`] and the writer commands
//! print to. Nothing is global: two handles on two directories are fully
//! independent, which is what fetch and push rely on.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::merge_state::{MERGE_CONFLICTS_FILE, MergeState};
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::HEAD_REF_NAME;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::index::index_entry::{IndexEntry, validate_path};
use crate::artifacts::log::rev_list::{self, CommitWalk};
use crate::artifacts::merge::MergeOutcome;
use crate::artifacts::merge::merge_base::MergeBaseFinder;
use crate::artifacts::merge::resolver::Resolver;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::tree::FlatTree;
use crate::artifacts::tree::builder;
use crate::artifacts::tree::flatten::flatten;
use crate::config::Config;
use crate::errors::{Error, IoContext, Result};
use std::cell::{RefCell, RefMut};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

const OBJECTS_DIR: &str = "objects";
const INDEX_FILE: &str = "index";

/// An object met while walking history, tagged with how to expand it
enum Reachable {
    Commit(ObjectId),
    Tree(ObjectId),
    Blob(ObjectId),
}

impl Reachable {
    fn oid(&self) -> &ObjectId {
        match self {
            Reachable::Commit(oid) | Reachable::Tree(oid) | Reachable::Blob(oid) => oid,
        }
    }

    fn into_oid(self) -> ObjectId {
        match self {
            Reachable::Commit(oid) | Reachable::Tree(oid) | Reachable::Blob(oid) => oid,
        }
    }
}

pub struct Repository {
    /// Working tree root
    path: Box<Path>,
    config: Config,
    writer: RefCell<Box<dyn Write>>,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    merge_state: MergeState,
}

impl Repository {
    /// A handle on the repository rooted at `path`, whether or not it is initialized yet
    ///
    /// # Arguments
    ///
    /// * `path` - Working tree root; must exist
    /// * `config` - Identity, default branch and ignore list
    /// * `writer` - Where commands print their output
    pub fn new(path: &Path, config: Config, writer: Box<dyn Write>) -> Result<Self> {
        let path = path.canonicalize().at(path)?;
        let kit_dir = path.join(&config.repository_dir);

        Ok(Repository {
            index: RefCell::new(Index::new(kit_dir.join(INDEX_FILE).into_boxed_path())),
            database: Database::new(kit_dir.join(OBJECTS_DIR).into_boxed_path()),
            workspace: Workspace::new(path.clone().into_boxed_path(), config.ignore.clone()),
            refs: Refs::new(kit_dir.clone().into_boxed_path()),
            merge_state: MergeState::new(kit_dir.join(MERGE_CONFLICTS_FILE).into_boxed_path()),
            path: path.into_boxed_path(),
            config,
            writer: RefCell::new(writer),
        })
    }

    /// The repository containing `path`, looking through its parent directories
    ///
    /// # Errors
    ///
    /// `Io` with `NotFound` when no ancestor of `path` holds a repository
    /// directory.
    pub fn discover(path: &Path, config: Config, writer: Box<dyn Write>) -> Result<Self> {
        let start = path.canonicalize().at(path)?;
        let root = start
            .ancestors()
            .find(|dir| dir.join(&config.repository_dir).is_dir())
            .ok_or_else(|| {
                Error::io(
                    &start,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "not a kit repository"),
                )
            })?;

        Self::new(root, config, writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kit_dir(&self) -> PathBuf {
        self.path.join(&self.config.repository_dir)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn merge_state(&self) -> &MergeState {
        &self.merge_state
    }

    /// Create the repository layout with HEAD on the default branch
    ///
    /// Returns `false` when a repository already existed; nothing is reset then.
    pub fn initialize(&self) -> Result<bool> {
        let kit_dir = self.kit_dir();
        let existed = self.refs.exists(&RefName::head());

        for dir in [
            kit_dir.join(OBJECTS_DIR),
            kit_dir.join("refs").join("heads"),
            kit_dir.join("refs").join("tags"),
        ] {
            std::fs::create_dir_all(&dir).at(&dir)?;
        }

        if !existed {
            self.refs
                .attach_head(&RefName::branch(&self.config.default_branch)?)?;
            tracing::debug!(path = %kit_dir.display(), "initialized repository");
        }

        Ok(!existed)
    }

    /// Run `update` against the index as stored on disk, persisting it if it changed
    ///
    /// # Arguments
    ///
    /// * `update` - Closure that edits the freshly loaded index
    ///
    /// # Returns
    ///
    /// Whatever `update` returned. Nothing is written when it fails.
    pub fn update_index<T>(&self, update: impl FnOnce(&mut Index) -> Result<T>) -> Result<T> {
        let mut index = self.index.borrow_mut();
        index.rehydrate()?;

        let result = update(&mut index)?;
        if index.is_changed() {
            index.write_updates()?;
        }

        Ok(result)
    }

    /// Store `content` as a blob and stage it at `path`
    ///
    /// Staging a path of a conflicted merge marks it resolved.
    pub fn stage(&self, path: &str, content: &[u8]) -> Result<ObjectId> {
        self.update_index(|index| self.stage_entry(index, path, content))
    }

    /// Stage the working-tree state of each path
    ///
    /// A path that is tracked but gone from the working tree (file or whole
    /// directory) is dropped from the index instead.
    ///
    /// # Arguments
    ///
    /// * `paths` - Repository-relative paths; the empty path means everything
    ///
    /// # Returns
    ///
    /// Every path that was staged or dropped, in the order handled
    pub fn stage_paths(&self, paths: &[String]) -> Result<Vec<String>> {
        let files = self.workspace.list_files()?;
        let present = files.iter().map(String::as_str).collect::<HashSet<_>>();

        self.update_index(|index| {
            let mut staged = Vec::new();

            for path in paths {
                let under = |file: &String| {
                    path.is_empty() || file == path || file.starts_with(&format!("{path}/"))
                };
                let matching = files.iter().filter(|file| under(file)).collect::<Vec<_>>();
                let gone = index
                    .entries()
                    .map(|entry| entry.path.clone())
                    .filter(|tracked| under(tracked) && !present.contains(tracked.as_str()))
                    .collect::<Vec<_>>();

                for tracked in gone {
                    index.remove(&tracked);
                    self.merge_state.resolve(&tracked)?;
                    staged.push(tracked);
                }

                for file in matching {
                    let content = self.workspace.read_file(file)?;
                    self.stage_entry(index, file, &content)?;
                    staged.push(file.clone());
                }
            }

            Ok(staged)
        })
    }

    fn stage_entry(&self, index: &mut Index, path: &str, content: &[u8]) -> Result<ObjectId> {
        validate_path(path)?;

        let oid = self.database.put(ObjectType::Blob, content)?;
        index.add(IndexEntry::new(path.to_string(), oid.clone()));
        self.merge_state.resolve(path)?;

        Ok(oid)
    }

    pub fn unstage_all(&self) -> Result<()> {
        self.update_index(|index| {
            index.clear();
            Ok(())
        })
    }

    /// Store the staged content as tree objects and return the root tree
    pub fn write_tree(&self) -> Result<ObjectId> {
        let staged = self.get_index_tree()?;
        self.store_tree(&staged)
    }

    /// Store a flat mapping as tree objects and return the root tree
    pub fn store_tree(&self, flat: &FlatTree) -> Result<ObjectId> {
        builder::write_tree(flat, |tree| self.database.store(tree))
    }

    /// Make the index and the tracked working-tree files match `tree_oid`
    ///
    /// Files tracked before but absent from the tree are removed, untracked
    /// files are left alone.
    pub fn read_tree(&self, tree_oid: &ObjectId) -> Result<()> {
        let target = self.flatten_tree(tree_oid)?;
        self.materialize(&target)
    }

    fn flatten_tree(&self, tree_oid: &ObjectId) -> Result<FlatTree> {
        flatten(tree_oid, |oid| self.database.load_tree(oid))
    }

    fn materialize(&self, target: &FlatTree) -> Result<()> {
        // every blob must be readable before the working tree is touched
        if let Some(missing) = target.values().find(|oid| !self.database.contains(oid)) {
            return Err(Error::ObjectNotFound(missing.clone()));
        }

        self.update_index(|index| {
            let tracked = index.snapshot();

            for path in tracked.keys().filter(|path| !target.contains_key(*path)) {
                self.workspace.remove_file(path)?;
            }

            for (path, oid) in target {
                let blob = self.database.load_blob(oid)?;
                self.workspace.write_file(path, blob.content())?;
            }

            index.replace(target);
            tracing::debug!(files = target.len(), "materialized tree");

            Ok(())
        })
    }

    /// The flat `path -> blob` mapping of a commit's tree
    pub fn get_tree(&self, commit_oid: &ObjectId) -> Result<FlatTree> {
        let commit = self.database.load_commit(commit_oid)?;
        self.flatten_tree(commit.tree_oid())
    }

    /// The staged `path -> blob` mapping, reloaded from disk
    pub fn get_index_tree(&self) -> Result<FlatTree> {
        let mut index = self.index.borrow_mut();
        index.rehydrate()?;

        Ok(index.snapshot())
    }

    /// The working tree as `path -> blob`, hashed without storing anything
    pub fn get_working_tree(&self) -> Result<FlatTree> {
        self.workspace.hash_files()
    }

    /// The tree of the commit HEAD points at, empty on an unborn branch
    pub fn get_head_tree(&self) -> Result<FlatTree> {
        match self.refs.read_head()? {
            Some(head) => self.get_tree(&head),
            None => Ok(FlatTree::new()),
        }
    }

    /// Write a commit object; moves no ref
    ///
    /// # Arguments
    ///
    /// * `tree_oid` - Root tree of the snapshot
    /// * `parents` - Parent commits, first parent first
    /// * `message` - Commit message, stored verbatim
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` or `UnexpectedObjectType` unless the tree and every
    /// parent are already stored with the right kind.
    pub fn create_commit(
        &self,
        tree_oid: &ObjectId,
        parents: Vec<ObjectId>,
        message: &str,
    ) -> Result<ObjectId> {
        let tree_kind = self.database.get_object_type(tree_oid)?;
        if tree_kind != ObjectType::Tree {
            return Err(Error::UnexpectedObjectType {
                oid: tree_oid.clone(),
                expected: ObjectType::Tree,
                actual: tree_kind,
            });
        }
        for parent in &parents {
            self.database.load_commit(parent)?;
        }

        let commit = Commit::new(
            parents,
            tree_oid.clone(),
            self.config.author(),
            message.to_string(),
        );
        let oid = self.database.store(&commit)?;
        tracing::debug!(%oid, tree = %tree_oid, parents = commit.parents().len(), "created commit");

        Ok(oid)
    }

    /// Commit the index on top of HEAD and advance it
    ///
    /// While a merge is waiting, refuses as long as conflicts are unresolved;
    /// otherwise `MERGE_HEAD` becomes the second parent and the merge state is
    /// cleared.
    pub fn commit_index(&self, message: &str) -> Result<ObjectId> {
        let unresolved = self.merge_state.conflicts()?;
        if !unresolved.is_empty() {
            return Err(Error::MergeConflict {
                paths: unresolved.into_iter().collect(),
            });
        }

        let tree_oid = self.write_tree()?;
        let parents = self
            .refs
            .read_head()?
            .into_iter()
            .chain(self.refs.read_merge_head()?)
            .collect::<Vec<_>>();

        let oid = self.create_commit(&tree_oid, parents, message)?;
        self.refs.update_head(&oid)?;
        self.clear_merge()?;
        tracing::info!(commit = %oid, "advanced HEAD");

        Ok(oid)
    }

    /// Forget a waiting merge: `MERGE_HEAD` and the unresolved path list
    pub fn clear_merge(&self) -> Result<()> {
        self.refs.clear_merge_head()?;
        self.merge_state.clear()
    }

    /// Resolve a revision expression to an object ID
    ///
    /// # Arguments
    ///
    /// * `revision` - A ref, short name, OID prefix or `@`, optionally
    ///   followed by `^` and `~<n>` suffixes
    ///
    /// # Errors
    ///
    /// `RefNotFound` for unknown names and `AmbiguousReference` when a short
    /// name or OID prefix matches more than one object.
    pub fn resolve_revision(&self, revision: &str) -> Result<ObjectId> {
        Revision::try_parse(revision)?.resolve(&self.refs, &self.database)
    }

    pub fn parents_of(&self, oid: &ObjectId) -> Result<Vec<ObjectId>> {
        Ok(self.database.load_commit(oid)?.parents().to_vec())
    }

    /// Every commit reachable from `oid`, inclusive
    pub fn ancestors(&self, oid: &ObjectId) -> Result<HashSet<ObjectId>> {
        rev_list::ancestors(oid, |oid| self.parents_of(oid))
    }

    /// Is `maybe_ancestor` reachable from `commit` (or the same commit)?
    pub fn is_ancestor_of(&self, commit: &ObjectId, maybe_ancestor: &ObjectId) -> Result<bool> {
        rev_list::is_ancestor_of(commit, maybe_ancestor, |oid| self.parents_of(oid))
    }

    /// Best common ancestor of two commits
    ///
    /// # Returns
    ///
    /// `None` when the histories are unrelated. When several best ancestors
    /// exist, one of them is picked deterministically.
    pub fn merge_base(&self, a: &ObjectId, b: &ObjectId) -> Result<Option<ObjectId>> {
        MergeBaseFinder::new(|oid: &ObjectId| self.parents_of(oid)).find(a, b)
    }

    /// History walk from `oids`, first parents before other parents
    pub fn iter_commits_and_parents(
        &self,
        oids: impl IntoIterator<Item = ObjectId>,
    ) -> CommitWalk<impl Fn(&ObjectId) -> Result<Vec<ObjectId>> + '_> {
        CommitWalk::new(oids, move |oid: &ObjectId| self.parents_of(oid))
    }

    /// Every object reachable from `commits`: the commits, their trees and blobs
    ///
    /// Objects for which `known` holds are skipped, and so is the history
    /// behind a known commit.
    ///
    /// # Arguments
    ///
    /// * `commits` - Tips to walk from
    /// * `known` - Whether the receiving side already has an object
    ///
    /// # Returns
    ///
    /// The missing objects in dependency order: each object comes after every
    /// object it refers to (parents, trees, blobs), even when several commits
    /// share a subtree.
    pub fn iter_objects_in_commits<F>(
        &self,
        commits: impl IntoIterator<Item = ObjectId>,
        known: F,
    ) -> Result<Vec<ObjectId>>
    where
        F: Fn(&ObjectId) -> bool,
    {
        let mut pending = commits
            .into_iter()
            .map(|oid| (Reachable::Commit(oid), false))
            .collect::<Vec<_>>();
        pending.reverse();

        let mut objects = Vec::new();
        let mut visited = HashSet::new();

        while let Some((node, expanded)) = pending.pop() {
            if expanded {
                objects.push(node.into_oid());
                continue;
            }
            if known(node.oid()) || !visited.insert(node.oid().clone()) {
                continue;
            }

            let references = match &node {
                Reachable::Commit(oid) => {
                    let commit = self.database.load_commit(oid)?;
                    let mut references = vec![Reachable::Tree(commit.tree_oid().clone())];
                    references.extend(commit.parents().iter().cloned().map(Reachable::Commit));
                    references
                }
                Reachable::Tree(oid) => self
                    .database
                    .load_tree(oid)?
                    .into_entries()
                    .map(|(_, entry)| {
                        if entry.is_tree() {
                            Reachable::Tree(entry.oid)
                        } else {
                            Reachable::Blob(entry.oid)
                        }
                    })
                    .collect(),
                Reachable::Blob(_) => Vec::new(),
            };

            pending.push((node, true));
            pending.extend(references.into_iter().rev().map(|reference| (reference, false)));
        }

        Ok(objects)
    }

    /// Three-way merge of `theirs` into HEAD
    ///
    /// A merge commit is only written when every path merges cleanly; otherwise
    /// the index and working tree keep the partial result with conflict markers,
    /// `MERGE_HEAD` is set and the unresolved paths are recorded.
    pub fn merge(&self, theirs: &ObjectId, message: &str) -> Result<MergeOutcome> {
        let pending = self.merge_state.conflicts()?;
        if self.merge_state.is_active() || self.refs.read_merge_head()?.is_some() {
            return Err(Error::MergeConflict {
                paths: pending.into_iter().collect(),
            });
        }

        let ours = self
            .refs
            .read_head()?
            .ok_or_else(|| Error::RefNotFound(HEAD_REF_NAME.to_string()))?;
        self.database.load_commit(theirs)?;

        let base = self.merge_base(&ours, theirs)?;

        if base.as_ref() == Some(theirs) {
            tracing::debug!(%ours, %theirs, "already up to date");
            return Ok(MergeOutcome::UpToDate);
        }

        if base.as_ref() == Some(&ours) {
            let tree_oid = self.database.load_commit(theirs)?.tree_oid().clone();
            self.read_tree(&tree_oid)?;
            self.refs.update_head(theirs)?;
            tracing::info!(from = %ours, to = %theirs, "fast-forwarded HEAD");

            return Ok(MergeOutcome::FastForward {
                from: ours,
                to: theirs.clone(),
            });
        }

        let base_tree = match &base {
            Some(base) => self.get_tree(base)?,
            None => FlatTree::new(),
        };
        let ours_tree = self.get_tree(&ours)?;
        let theirs_tree = self.get_tree(theirs)?;

        let merged = Resolver::new(&self.database).merge_trees(&base_tree, &ours_tree, &theirs_tree)?;
        self.materialize(&merged.tree)?;

        if !merged.is_clean() {
            self.refs.set_merge_head(theirs)?;
            self.merge_state
                .record(merged.conflicts.iter().map(|conflict| conflict.path.clone()))?;
            tracing::debug!(conflicts = merged.conflicts.len(), "merge stopped on conflicts");

            return Ok(MergeOutcome::Conflicted {
                conflicts: merged.conflicts,
            });
        }

        let tree_oid = self.store_tree(&merged.tree)?;
        let commit = self.create_commit(&tree_oid, vec![ours, theirs.clone()], message)?;
        self.refs.update_head(&commit)?;
        tracing::info!(%commit, "advanced HEAD to merge commit");

        Ok(MergeOutcome::Merged { commit })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::artifacts::merge::resolver::{Conflict, ConflictKind};
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    pub(crate) fn test_config() -> Config {
        Config {
            author_date: chrono::DateTime::parse_from_str(
                "2024-01-01 12:00:00 +0000",
                "%Y-%m-%d %H:%M:%S %z",
            )
            .ok(),
            ..Config::default()
        }
    }

    pub(crate) fn open(dir: &Path) -> Repository {
        let repository = Repository::new(dir, test_config(), Box::new(std::io::sink())).unwrap();
        repository.initialize().unwrap();
        repository
    }

    #[fixture]
    fn repo() -> (TempDir, Repository) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repository = open(dir.path());
        (dir, repository)
    }

    /// Stage `files` and commit them on top of HEAD
    fn commit_files(repository: &Repository, files: &[(&str, &str)], message: &str) -> ObjectId {
        for (path, content) in files {
            repository.workspace().write_file(path, content.as_bytes()).unwrap();
            repository.stage(path, content.as_bytes()).unwrap();
        }
        repository.commit_index(message).unwrap()
    }

    fn checkout_branch(repository: &Repository, name: &str) {
        let branch = RefName::branch(name).unwrap();
        let oid = repository.refs().resolve(&branch).unwrap();
        repository
            .read_tree(repository.database().load_commit(&oid).unwrap().tree_oid())
            .unwrap();
        repository.refs().attach_head(&branch).unwrap();
    }

    fn create_branch(repository: &Repository, name: &str) {
        let head = repository.refs().read_head().unwrap().unwrap();
        repository
            .refs()
            .create_ref(&RefName::branch(name).unwrap(), &head)
            .unwrap();
    }

    fn text(repository: &Repository, path: &str) -> String {
        String::from_utf8(repository.workspace().read_file(path).unwrap().to_vec()).unwrap()
    }

    #[rstest]
    fn initialize_is_idempotent(repo: (TempDir, Repository)) {
        let (dir, repository) = repo;

        assert!(!repository.initialize().unwrap());
        dir.child(".kit/HEAD").assert("ref: refs/heads/master");
    }

    #[rstest]
    fn empty_index_writes_the_empty_tree(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;

        assert_eq!(
            repository.write_tree().unwrap().as_ref(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
    }

    #[rstest]
    fn read_tree_restores_index_and_files(repo: (TempDir, Repository)) {
        let (dir, repository) = repo;
        repository.stage("a/b.txt", b"nested\n").unwrap();
        repository.stage("top.txt", b"top\n").unwrap();
        let tree = repository.write_tree().unwrap();
        let staged = repository.get_index_tree().unwrap();

        repository.unstage_all().unwrap();
        repository.stage("other.txt", b"other\n").unwrap();
        dir.child("other.txt").write_str("other\n").unwrap();
        dir.child("untracked.txt").write_str("mine\n").unwrap();

        repository.read_tree(&tree).unwrap();

        assert_eq!(repository.get_index_tree().unwrap(), staged);
        dir.child("a/b.txt").assert("nested\n");
        dir.child("top.txt").assert("top\n");
        dir.child("other.txt").assert(predicates::path::missing());
        dir.child("untracked.txt").assert("mine\n");
    }

    #[rstest]
    fn read_tree_of_a_missing_object_fails(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        let missing = ObjectId::try_parse("0123456789012345678901234567890123456789").unwrap();

        assert!(matches!(
            repository.read_tree(&missing),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[rstest]
    fn commit_parents_must_be_commits(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        let tree = repository.write_tree().unwrap();
        let blob = repository.database().put(ObjectType::Blob, b"blob").unwrap();
        let missing = ObjectId::try_parse("0123456789012345678901234567890123456789").unwrap();

        assert!(matches!(
            repository.create_commit(&tree, vec![blob], "bad"),
            Err(Error::UnexpectedObjectType { .. })
        ));
        assert!(matches!(
            repository.create_commit(&tree, vec![missing], "bad"),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[rstest]
    fn ancestry_of_a_chain(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        let a = commit_files(&repository, &[("f", "a")], "A");
        let b = commit_files(&repository, &[("f", "b")], "B");
        let c = commit_files(&repository, &[("f", "c")], "C");

        assert_eq!(
            repository.ancestors(&c).unwrap(),
            HashSet::from([a.clone(), b, c.clone()])
        );
        assert_eq!(repository.merge_base(&c, &a).unwrap(), Some(a.clone()));
        assert!(repository.is_ancestor_of(&c, &a).unwrap());
    }

    #[rstest]
    fn fast_forward_moves_the_branch_without_a_commit(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        let base = commit_files(&repository, &[("f", "a\n")], "base");
        create_branch(&repository, "topic");
        checkout_branch(&repository, "topic");
        let tip = commit_files(&repository, &[("g", "x\n")], "topic work");
        checkout_branch(&repository, "master");
        let objects_before = repository.database().count_objects().unwrap();

        let outcome = repository.merge(&tip, "merge topic").unwrap();

        assert_eq!(
            outcome,
            MergeOutcome::FastForward {
                from: base,
                to: tip.clone()
            }
        );
        assert_eq!(repository.database().count_objects().unwrap(), objects_before);
        assert_eq!(repository.refs().read_head().unwrap(), Some(tip));
        assert_eq!(text(&repository, "g"), "x\n");
    }

    #[rstest]
    fn merging_an_ancestor_is_up_to_date(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        let first = commit_files(&repository, &[("f", "a\n")], "first");
        commit_files(&repository, &[("f", "b\n")], "second");

        assert_eq!(
            repository.merge(&first, "noop").unwrap(),
            MergeOutcome::UpToDate
        );
    }

    #[rstest]
    fn divergent_additions_merge_into_a_two_parent_commit(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        commit_files(&repository, &[("f", "a")], "base");
        create_branch(&repository, "topic");
        let ours = commit_files(&repository, &[("g", "x")], "ours");
        checkout_branch(&repository, "topic");
        let theirs = commit_files(&repository, &[("h", "y")], "theirs");
        checkout_branch(&repository, "master");

        let MergeOutcome::Merged { commit } = repository.merge(&theirs, "merge topic").unwrap() else {
            panic!("expected a merge commit");
        };

        let merge_commit = repository.database().load_commit(&commit).unwrap();
        assert_eq!(merge_commit.parents(), &[ours, theirs]);
        assert_eq!(
            repository.get_tree(&commit).unwrap().keys().collect::<Vec<_>>(),
            vec!["f", "g", "h"]
        );
        assert_eq!(text(&repository, "h"), "y");
        assert_eq!(repository.refs().read_head().unwrap(), Some(commit));
    }

    #[rstest]
    fn conflicting_merge_waits_for_resolution(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        commit_files(&repository, &[("f", "line1\n")], "base");
        create_branch(&repository, "topic");
        let ours = commit_files(&repository, &[("f", "line1-ours\n")], "ours");
        checkout_branch(&repository, "topic");
        let theirs = commit_files(&repository, &[("f", "line1-theirs\n")], "theirs");
        checkout_branch(&repository, "master");

        let outcome = repository.merge(&theirs, "merge topic").unwrap();

        assert_eq!(
            outcome,
            MergeOutcome::Conflicted {
                conflicts: vec![Conflict {
                    path: "f".to_string(),
                    kind: ConflictKind::Content
                }]
            }
        );
        assert_eq!(
            text(&repository, "f"),
            "<<<<<<< HEAD\nline1-ours\n=======\nline1-theirs\n>>>>>>> MERGE_HEAD\n"
        );
        assert_eq!(repository.refs().read_head().unwrap(), Some(ours.clone()));
        assert!(matches!(
            repository.commit_index("too early"),
            Err(Error::MergeConflict { .. })
        ));

        repository.stage("f", b"resolved\n").unwrap();
        let commit = repository.commit_index("resolved").unwrap();

        let merge_commit = repository.database().load_commit(&commit).unwrap();
        assert_eq!(merge_commit.parents(), &[ours, theirs]);
        assert_eq!(repository.refs().read_merge_head().unwrap(), None);
        assert!(!repository.merge_state().is_active());
    }

    #[rstest]
    fn objects_behind_known_commits_are_skipped(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        let first = commit_files(&repository, &[("f", "a")], "first");
        let second = commit_files(&repository, &[("g", "b")], "second");

        let all = repository.iter_objects_in_commits([second.clone()], |_| false).unwrap();
        let new = repository
            .iter_objects_in_commits([second.clone()], |oid| {
                repository.ancestors(&first).unwrap().contains(oid)
            })
            .unwrap();

        // two commits, two root trees, two blobs
        assert_eq!(all.len(), 6);
        assert!(new.contains(&second));
        assert!(!new.contains(&first));
    }

    #[rstest]
    fn objects_are_listed_after_everything_they_refer_to(repo: (TempDir, Repository)) {
        let (_dir, repository) = repo;
        commit_files(&repository, &[("shared/deep/x", "x"), ("f", "1")], "first");
        commit_files(&repository, &[("f", "2")], "second");
        let tip = commit_files(&repository, &[("g", "3")], "third");

        let objects = repository.iter_objects_in_commits([tip], |_| false).unwrap();
        let position = |oid: &ObjectId| objects.iter().position(|listed| listed == oid).unwrap();

        // 3 commits, 3 roots, shared/ and shared/deep/, 4 blobs
        assert_eq!(objects.len(), 12);
        assert_eq!(objects.iter().collect::<HashSet<_>>().len(), objects.len());
        for (at, oid) in objects.iter().enumerate() {
            let references = match repository.database().get_object_type(oid).unwrap() {
                ObjectType::Commit => {
                    let commit = repository.database().load_commit(oid).unwrap();
                    let mut references = commit.parents().to_vec();
                    references.push(commit.tree_oid().clone());
                    references
                }
                ObjectType::Tree => repository
                    .database()
                    .load_tree(oid)
                    .unwrap()
                    .into_entries()
                    .map(|(_, entry)| entry.oid)
                    .collect(),
                ObjectType::Blob => Vec::new(),
            };
            for reference in references {
                assert!(position(&reference) < at, "{oid} listed before {reference}");
            }
        }
    }

    #[rstest]
    fn staging_a_directory_drops_deleted_files_and_keeps_the_rest(repo: (TempDir, Repository)) {
        let (dir, repository) = repo;
        let files = (0..50).map(|n| format!("d/{n:02}.txt")).collect::<Vec<_>>();
        for path in &files {
            dir.child(path).write_str(path).unwrap();
        }
        repository.stage_paths(&["d".to_string()]).unwrap();

        for path in files.iter().step_by(2) {
            std::fs::remove_file(dir.path().join(path)).unwrap();
        }
        let staged = repository.stage_paths(&["d".to_string()]).unwrap();

        assert_eq!(staged.len(), files.len());
        let tracked = repository.get_index_tree().unwrap();
        assert_eq!(
            tracked.keys().cloned().collect::<Vec<_>>(),
            files.iter().skip(1).step_by(2).cloned().collect::<Vec<_>>()
        );
    }
}
