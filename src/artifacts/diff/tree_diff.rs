use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::tree::FlatTree;
use bitflags::bitflags;
use std::collections::BTreeSet;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DiffFilter: u32 {
        const ADDED = 0b0001;
        const DELETED = 0b0010;
        const MODIFIED = 0b0100;
    }
}

impl DiffFilter {
    /// Parse a `--diff-filter` style string such as `AM`
    pub fn try_parse(s: &str) -> Option<Self> {
        let mut filter = Self::empty();

        for c in s.chars() {
            match c {
                'A' => filter |= Self::ADDED,
                'D' => filter |= Self::DELETED,
                'M' => filter |= Self::MODIFIED,
                _ => return None,
            }
        }

        (!filter.is_empty()).then_some(filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    /// One-letter status code (`A`, `D`, `M`)
    pub fn code(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Removed => 'D',
            ChangeKind::Modified => 'M',
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ChangeKind::Added => "new file",
            ChangeKind::Removed => "deleted",
            ChangeKind::Modified => "modified",
        }
    }
}

/// A single path that differs between two trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
    pub old_oid: Option<ObjectId>,
    pub new_oid: Option<ObjectId>,
}

impl Change {
    pub fn from_entries(
        path: &str,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
    ) -> Option<Self> {
        let kind = match (old, new) {
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            (Some(old), Some(new)) if old != new => ChangeKind::Modified,
            _ => return None,
        };

        Some(Change {
            path: path.to_string(),
            kind,
            old_oid: old.cloned(),
            new_oid: new.cloned(),
        })
    }

    pub fn matches_filter(&self, filter: DiffFilter) -> bool {
        match self.kind {
            ChangeKind::Added => filter.contains(DiffFilter::ADDED),
            ChangeKind::Removed => filter.contains(DiffFilter::DELETED),
            ChangeKind::Modified => filter.contains(DiffFilter::MODIFIED),
        }
    }
}

/// Compare two flat trees, ordered by path
///
/// Paths only in `new` are added, only in `old` removed, and paths whose blob
/// differs are modified. Identical paths are omitted.
pub fn diff_trees(old: &FlatTree, new: &FlatTree) -> Vec<Change> {
    let paths = old.keys().chain(new.keys()).collect::<BTreeSet<_>>();

    paths
        .into_iter()
        .filter_map(|path| Change::from_entries(path, old.get(path), new.get(path)))
        .collect()
}
