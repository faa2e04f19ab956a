//! Merge engine
//!
//! - `merge_base`: nearest common ancestor of two commits
//! - `merge3`: line-based three-way text merge with conflict markers
//! - `resolver`: path-by-path three-way tree merge

pub mod merge3;
pub mod merge_base;
pub mod resolver;

use crate::artifacts::merge::resolver::Conflict;
use crate::artifacts::objects::object_id::ObjectId;

/// What a merge did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The other side is already contained in HEAD
    UpToDate,
    /// HEAD was an ancestor and now points at the other side
    FastForward { from: ObjectId, to: ObjectId },
    /// A merge commit with both sides as parents
    Merged { commit: ObjectId },
    /// Unresolved paths are waiting in the index and working tree
    Conflicted { conflicts: Vec<Conflict> },
}
