//! Merge base lookup
//!
//! The merge base of `source` and `target` is found in two passes:
//!
//! 1. Mark every commit reachable from `source` (inclusive).
//! 2. Walk breadth-first from `target`, following parents in order (first
//!    parent first), and stop at the first commit marked in pass 1.
//!
//! This yields a single nearest common ancestor and prefers the first-parent
//! line of `target`. In criss-cross histories with several best common
//! ancestors it picks one of them rather than synthesizing a virtual base.

use crate::artifacts::log::rev_list::CommitWalk;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use bitflags::bitflags;
use std::collections::{HashMap, VecDeque};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct VisitState: u8 {
        const VISITED_FROM_SOURCE = 0b01;
        const VISITED_FROM_TARGET = 0b10;
        const VISITED_FROM_BOTH = Self::VISITED_FROM_SOURCE.bits() | Self::VISITED_FROM_TARGET.bits();
    }
}

/// Finds the merge base of two commits
///
/// Takes a parent loader so it runs unchanged over the object database or an
/// in-memory graph.
pub struct MergeBaseFinder<F>
where
    F: Fn(&ObjectId) -> Result<Vec<ObjectId>>,
{
    parents_of: F,
}

impl<F> MergeBaseFinder<F>
where
    F: Fn(&ObjectId) -> Result<Vec<ObjectId>>,
{
    pub fn new(parents_of: F) -> Self {
        Self { parents_of }
    }

    /// `None` when the histories share no commit
    pub fn find(&self, source: &ObjectId, target: &ObjectId) -> Result<Option<ObjectId>> {
        let mut states = HashMap::<ObjectId, VisitState>::new();

        for oid in CommitWalk::new([source.clone()], |oid: &ObjectId| (self.parents_of)(oid)) {
            states.insert(oid?, VisitState::VISITED_FROM_SOURCE);
        }
        tracing::trace!(%source, reachable = states.len(), "marked source ancestry");

        let mut queue = VecDeque::from([target.clone()]);
        while let Some(oid) = queue.pop_front() {
            let state = states.entry(oid.clone()).or_insert(VisitState::empty());
            if state.contains(VisitState::VISITED_FROM_TARGET) {
                continue;
            }
            *state |= VisitState::VISITED_FROM_TARGET;

            if state.contains(VisitState::VISITED_FROM_BOTH) {
                tracing::debug!(%source, %target, base = %oid, "found merge base");
                return Ok(Some(oid));
            }

            queue.extend((self.parents_of)(&oid)?);
        }

        tracing::debug!(%source, %target, "histories are unrelated");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::log::rev_list::graph::{InMemoryCommitStore, create_oid};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn linear_history() -> InMemoryCommitStore {
        // A <- B <- C <- D
        let mut store = InMemoryCommitStore::default();
        store.add_commit("commit_a", &[]);
        store.add_commit("commit_b", &["commit_a"]);
        store.add_commit("commit_c", &["commit_b"]);
        store.add_commit("commit_d", &["commit_c"]);
        store
    }

    #[fixture]
    fn simple_merge() -> InMemoryCommitStore {
        //     A
        //    / \
        //   B   C
        //    \ /
        //     D (merge commit)
        let mut store = InMemoryCommitStore::default();
        store.add_commit("commit_a", &[]);
        store.add_commit("commit_b", &["commit_a"]);
        store.add_commit("commit_c", &["commit_a"]);
        store.add_commit("commit_d", &["commit_b", "commit_c"]);
        store
    }

    #[fixture]
    fn criss_cross_merge() -> InMemoryCommitStore {
        //     A
        //    / \
        //   B   C
        //   |\ /|
        //   | X |
        //   |/ \|
        //   D   E
        let mut store = InMemoryCommitStore::default();
        store.add_commit("commit_a", &[]);
        store.add_commit("commit_b", &["commit_a"]);
        store.add_commit("commit_c", &["commit_a"]);
        store.add_commit("commit_d", &["commit_b", "commit_c"]);
        store.add_commit("commit_e", &["commit_c", "commit_b"]);
        store
    }

    fn merge_base(store: &InMemoryCommitStore, source: &str, target: &str) -> Option<ObjectId> {
        MergeBaseFinder::new(|oid: &ObjectId| store.parents_of(oid))
            .find(&create_oid(source), &create_oid(target))
            .unwrap()
    }

    #[rstest]
    fn linear_history_base_is_the_older_commit(linear_history: InMemoryCommitStore) {
        let a = create_oid("commit_a");
        let b = create_oid("commit_b");
        let c = create_oid("commit_c");

        assert_eq!(merge_base(&linear_history, "commit_c", "commit_c"), Some(c));
        assert_eq!(merge_base(&linear_history, "commit_b", "commit_d"), Some(b.clone()));
        assert_eq!(merge_base(&linear_history, "commit_d", "commit_b"), Some(b));
        assert_eq!(merge_base(&linear_history, "commit_d", "commit_a"), Some(a));
    }

    #[rstest]
    fn branches_meet_at_their_fork(simple_merge: InMemoryCommitStore) {
        let a = create_oid("commit_a");

        assert_eq!(merge_base(&simple_merge, "commit_b", "commit_c"), Some(a.clone()));
        assert_eq!(merge_base(&simple_merge, "commit_c", "commit_b"), Some(a.clone()));
        assert_eq!(merge_base(&simple_merge, "commit_a", "commit_d"), Some(a));
        assert_eq!(
            merge_base(&simple_merge, "commit_d", "commit_c"),
            Some(create_oid("commit_c"))
        );
    }

    #[rstest]
    fn criss_cross_prefers_the_first_parent(criss_cross_merge: InMemoryCommitStore) {
        assert_eq!(
            merge_base(&criss_cross_merge, "commit_d", "commit_e"),
            Some(create_oid("commit_c"))
        );
        assert_eq!(
            merge_base(&criss_cross_merge, "commit_e", "commit_d"),
            Some(create_oid("commit_b"))
        );
    }

    #[test]
    fn unrelated_histories_have_no_base() {
        let mut store = InMemoryCommitStore::default();
        store.add_commit("root_one", &[]);
        store.add_commit("root_two", &[]);

        assert_eq!(merge_base(&store, "root_one", "root_two"), None);
    }
}
