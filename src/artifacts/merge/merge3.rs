//! Line-based three-way text merge
//!
//! Both sides are diffed against the base with `similar`. Each change is a
//! hunk in base coordinates; hunks from either side that overlap or touch are
//! clustered. A cluster changed by one side takes that side, a cluster changed
//! identically by both takes either, anything else becomes a conflict block:
//!
//! ```text
//! <<<<<<< HEAD
//! ours
//! =======
//! theirs
//! >>>>>>> MERGE_HEAD
//! ```

use similar::{Algorithm, DiffTag, capture_diff_slices};
use std::ops::Range;

/// Labels written after the conflict markers
#[derive(Debug, Clone)]
pub struct MergeLabels {
    pub ours: String,
    pub theirs: String,
}

impl Default for MergeLabels {
    fn default() -> Self {
        MergeLabels {
            ours: "HEAD".to_string(),
            theirs: "MERGE_HEAD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge3Result {
    pub content: Vec<u8>,
    pub conflicts: usize,
}

impl Merge3Result {
    pub fn is_clean(&self) -> bool {
        self.conflicts == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Ours,
    Theirs,
}

/// A change on one side: `base` lines replaced by `side` lines
#[derive(Debug, Clone)]
struct Hunk {
    side: Side,
    base: Range<usize>,
    lines: Range<usize>,
}

fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    content.split_inclusive(|byte| *byte == b'\n').collect()
}

fn hunks(base: &[&[u8]], other: &[&[u8]], side: Side) -> Vec<Hunk> {
    capture_diff_slices(Algorithm::Myers, base, other)
        .iter()
        .map(|op| op.as_tag_tuple())
        .filter(|(tag, _, _)| *tag != DiffTag::Equal)
        .map(|(_, base, lines)| Hunk { side, base, lines })
        .collect()
}

/// The lines a side holds for `cluster`, given that side's hunks inside it
///
/// Outside its hunks a side matches the base, so the edges extend by the
/// distance between the cluster bounds and the outermost hunks.
fn side_range(cluster: &Range<usize>, hunks: &[&Hunk]) -> Option<Range<usize>> {
    let first = hunks.first()?;
    let last = hunks.last()?;

    let start = first.lines.start - (first.base.start - cluster.start);
    let end = last.lines.end + (cluster.end - last.base.end);

    Some(start..end)
}

fn push_lines(output: &mut Vec<u8>, lines: &[&[u8]]) {
    for line in lines {
        output.extend_from_slice(line);
    }
}

fn push_block(output: &mut Vec<u8>, lines: &[&[u8]]) {
    push_lines(output, lines);
    if output.last().is_some_and(|byte| *byte != b'\n') {
        output.push(b'\n');
    }
}

/// Merge `ours` and `theirs`, both descended from `base`
pub fn merge3(base: &[u8], ours: &[u8], theirs: &[u8], labels: &MergeLabels) -> Merge3Result {
    let base_lines = split_lines(base);
    let our_lines = split_lines(ours);
    let their_lines = split_lines(theirs);

    let mut all_hunks = hunks(&base_lines, &our_lines, Side::Ours);
    all_hunks.extend(hunks(&base_lines, &their_lines, Side::Theirs));
    all_hunks.sort_by_key(|hunk| (hunk.base.start, hunk.base.end));

    let mut content = Vec::new();
    let mut conflicts = 0;
    let mut base_pos = 0;
    let mut idx = 0;

    while idx < all_hunks.len() {
        let mut cluster = all_hunks[idx].base.clone();
        let mut end_idx = idx + 1;
        while end_idx < all_hunks.len() && all_hunks[end_idx].base.start <= cluster.end {
            cluster.end = cluster.end.max(all_hunks[end_idx].base.end);
            end_idx += 1;
        }
        let members = &all_hunks[idx..end_idx];

        push_lines(&mut content, &base_lines[base_pos..cluster.start]);

        let ours_hunks = members.iter().filter(|h| h.side == Side::Ours).collect::<Vec<_>>();
        let theirs_hunks = members.iter().filter(|h| h.side == Side::Theirs).collect::<Vec<_>>();

        let our_range = side_range(&cluster, &ours_hunks);
        let their_range = side_range(&cluster, &theirs_hunks);

        match (our_range, their_range) {
            (Some(ours), None) => push_lines(&mut content, &our_lines[ours]),
            (None, Some(theirs)) => push_lines(&mut content, &their_lines[theirs]),
            (Some(ours), Some(theirs)) if our_lines[ours.clone()] == their_lines[theirs.clone()] => {
                push_lines(&mut content, &our_lines[ours]);
            }
            (Some(ours), Some(theirs)) => {
                conflicts += 1;
                content.extend_from_slice(format!("<<<<<<< {}\n", labels.ours).as_bytes());
                push_block(&mut content, &our_lines[ours]);
                content.extend_from_slice(b"=======\n");
                push_block(&mut content, &their_lines[theirs]);
                content.extend_from_slice(format!(">>>>>>> {}\n", labels.theirs).as_bytes());
            }
            (None, None) => push_lines(&mut content, &base_lines[cluster.clone()]),
        }

        base_pos = cluster.end;
        idx = end_idx;
    }

    push_lines(&mut content, &base_lines[base_pos..]);

    Merge3Result { content, conflicts }
}

/// Wrap one side's content in conflict markers against an empty other side
///
/// Used when one side deleted a file the other side modified; the deleted
/// side's label gets a `(deleted)` suffix.
pub fn conflict_block(ours: Option<&[u8]>, theirs: Option<&[u8]>, labels: &MergeLabels) -> Vec<u8> {
    let label = |name: &str, side: Option<&[u8]>| match side {
        Some(_) => name.to_string(),
        None => format!("{name} (deleted)"),
    };

    let mut content = Vec::new();
    content.extend_from_slice(format!("<<<<<<< {}\n", label(&labels.ours, ours)).as_bytes());
    if let Some(ours) = ours {
        push_block(&mut content, &split_lines(ours));
    }
    content.extend_from_slice(b"=======\n");
    if let Some(theirs) = theirs {
        push_block(&mut content, &split_lines(theirs));
    }
    content.extend_from_slice(format!(">>>>>>> {}\n", label(&labels.theirs, theirs)).as_bytes());

    content
}
