use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::collections::{HashSet, VecDeque};

/// Every commit reachable from `start` through parent links, `start` included
pub fn ancestors<F>(start: &ObjectId, parents_of: F) -> Result<HashSet<ObjectId>>
where
    F: Fn(&ObjectId) -> Result<Vec<ObjectId>>,
{
    CommitWalk::new([start.clone()], parents_of).collect()
}

/// Is `maybe_ancestor` reachable from `commit` (or the same commit)?
pub fn is_ancestor_of<F>(commit: &ObjectId, maybe_ancestor: &ObjectId, parents_of: F) -> Result<bool>
where
    F: Fn(&ObjectId) -> Result<Vec<ObjectId>>,
{
    for oid in CommitWalk::new([commit.clone()], parents_of) {
        if &oid? == maybe_ancestor {
            return Ok(true);
        }
    }

    Ok(false)
}

/// History walk over commits and their parents
///
/// Each commit is yielded once. The first parent of a commit is visited right
/// after it, other parents are queued behind everything already pending, so a
/// linear first-parent history reads newest to oldest.
pub struct CommitWalk<F> {
    pending: VecDeque<ObjectId>,
    visited: HashSet<ObjectId>,
    parents_of: F,
}

impl<F> CommitWalk<F>
where
    F: Fn(&ObjectId) -> Result<Vec<ObjectId>>,
{
    pub fn new(starts: impl IntoIterator<Item = ObjectId>, parents_of: F) -> Self {
        CommitWalk {
            pending: starts.into_iter().collect(),
            visited: HashSet::new(),
            parents_of,
        }
    }
}

impl<F> Iterator for CommitWalk<F>
where
    F: Fn(&ObjectId) -> Result<Vec<ObjectId>>,
{
    type Item = Result<ObjectId>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(oid) = self.pending.pop_front() {
            if !self.visited.insert(oid.clone()) {
                continue;
            }

            let parents = match (self.parents_of)(&oid) {
                Ok(parents) => parents,
                Err(e) => {
                    self.pending.clear();
                    return Some(Err(e));
                }
            };

            let mut parents = parents.into_iter();
            if let Some(first) = parents.next() {
                self.pending.push_front(first);
            }
            self.pending.extend(parents);

            return Some(Ok(oid));
        }

        None
    }
}

#[cfg(test)]
pub(crate) mod graph {
    use crate::artifacts::objects::object_id::ObjectId;
    use crate::errors::{Error, Result};
    use std::collections::HashMap;

    /// In-memory commit graph for walks and merge-base tests
    #[derive(Debug, Clone, Default)]
    pub(crate) struct InMemoryCommitStore {
        parents: HashMap<ObjectId, Vec<ObjectId>>,
    }

    impl InMemoryCommitStore {
        pub(crate) fn add_commit(&mut self, commit: &str, parents: &[&str]) -> ObjectId {
            let oid = create_oid(commit);
            self.parents
                .insert(oid.clone(), parents.iter().map(|p| create_oid(p)).collect());
            oid
        }

        pub(crate) fn parents_of(&self, oid: &ObjectId) -> Result<Vec<ObjectId>> {
            self.parents
                .get(oid)
                .cloned()
                .ok_or_else(|| Error::ObjectNotFound(oid.clone()))
        }
    }

    /// A deterministic 40-character hex ObjectId derived from a name
    pub(crate) fn create_oid(id: &str) -> ObjectId {
        let mut hex_string = id
            .as_bytes()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();

        while hex_string.len() < 40 {
            hex_string.push('0');
        }
        hex_string.truncate(40);

        ObjectId::try_parse(hex_string).expect("Invalid test ObjectId")
    }
}
