//! Object transfer between two local repositories
//!
//! A remote is another repository on the filesystem. Fetch and push copy the
//! stored object files the other side lacks in dependency order, so an
//! interrupted transfer never leaves an object whose references are missing.

use crate::areas::database::Database;
use crate::areas::refs::RefValue;
use crate::areas::repository::Repository;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::path::Path;

impl Repository {
    fn open_remote(&self, remote_path: &Path) -> Result<Repository> {
        if !remote_path.join(&self.config().repository_dir).is_dir() {
            return Err(Error::io(
                remote_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a kit repository"),
            ));
        }

        Repository::new(remote_path, self.config().clone(), Box::new(std::io::sink()))
    }

    /// Copy every branch of the remote into `refs/remote/<branch>`
    ///
    /// Returns the updated local refs with the tips they now point at.
    pub fn fetch(&self, remote_path: &Path) -> Result<Vec<(RefName, ObjectId)>> {
        let remote = self.open_remote(remote_path)?;
        let branches = remote.refs().list_branches()?;

        let missing = remote.iter_objects_in_commits(
            branches.iter().map(|(_, oid)| oid.clone()),
            |oid| self.database().contains(oid),
        )?;
        let copied = copy_objects(remote.database(), self.database(), &missing)?;

        let mut updated = Vec::new();
        for (branch, oid) in branches {
            let local = RefName::remote(branch.short_name())?;
            self.refs()
                .update_ref(&local, &RefValue::Direct(oid.clone()), false)?;
            updated.push((local, oid));
        }
        tracing::info!(remote = %remote_path.display(), copied, refs = updated.len(), "fetched");

        Ok(updated)
    }

    /// Publish a local branch to the remote's branch of the same name
    ///
    /// Refuses unless the remote branch is missing or an ancestor of the local
    /// tip.
    pub fn push(&self, remote_path: &Path, branch: &str) -> Result<ObjectId> {
        let remote = self.open_remote(remote_path)?;
        let name = RefName::branch(branch)?;
        let local = self.refs().resolve(&name)?;

        if let Some(remote_tip) = remote.refs().try_resolve(&name)? {
            if remote_tip == local {
                tracing::debug!(%name, "remote already up to date");
                return Ok(local);
            }

            let fast_forward =
                self.database().contains(&remote_tip) && self.is_ancestor_of(&local, &remote_tip)?;
            if !fast_forward {
                return Err(Error::NonFastForward {
                    name: name.to_string(),
                    local,
                    remote: remote_tip,
                });
            }
        }

        let missing =
            self.iter_objects_in_commits([local.clone()], |oid| remote.database().contains(oid))?;
        let copied = copy_objects(self.database(), remote.database(), &missing)?;

        remote
            .refs()
            .update_ref(&name, &RefValue::Direct(local.clone()), false)?;
        tracing::info!(remote = %remote_path.display(), %name, copied, "pushed");

        Ok(local)
    }
}

/// Copy `objects` in the order given, which lists referenced objects first
fn copy_objects(from: &Database, to: &Database, objects: &[ObjectId]) -> Result<usize> {
    let mut copied = 0;
    for oid in objects {
        if from.copy_object_to(oid, to)? {
            copied += 1;
        }
    }

    Ok(copied)
}
