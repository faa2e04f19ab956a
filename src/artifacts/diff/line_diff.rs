//! Line-level content diff
//!
//! Hunks come from `similar`'s Myers diff grouped with three lines of context.
//! Content that is not UTF-8 is not diffed line by line.

use similar::{ChangeTag, TextDiff};

/// Context lines kept around each change
pub const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Context(String),
    Added(String),
    Removed(String),
}

impl std::fmt::Display for Edit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edit::Context(line) => write!(f, " {line}"),
            Edit::Added(line) => write!(f, "+{line}"),
            Edit::Removed(line) => write!(f, "-{line}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    a_start: usize,
    a_size: usize,
    b_start: usize,
    b_size: usize,
    edits: Vec<Edit>,
}

impl Hunk {
    pub fn a_start(&self) -> usize {
        self.a_start
    }

    pub fn a_size(&self) -> usize {
        self.a_size
    }

    pub fn b_start(&self) -> usize {
        self.b_start
    }

    pub fn b_size(&self) -> usize {
        self.b_size
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// `@@ -a,n +b,m @@`
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.a_start, self.a_size, self.b_start, self.b_size
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDiff {
    Text(Vec<Hunk>),
    Binary,
}

impl LineDiff {
    pub fn is_empty(&self) -> bool {
        matches!(self, LineDiff::Text(hunks) if hunks.is_empty())
    }
}

pub fn line_diff(a: &[u8], b: &[u8]) -> LineDiff {
    let (Ok(a), Ok(b)) = (std::str::from_utf8(a), std::str::from_utf8(b)) else {
        return LineDiff::Binary;
    };

    let text_diff = TextDiff::from_lines(a, b);
    let mut hunks = Vec::new();

    for group in text_diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };

        let a_range = first.old_range().start..last.old_range().end;
        let b_range = first.new_range().start..last.new_range().end;

        let edits = group
            .iter()
            .flat_map(|op| text_diff.iter_changes(op))
            .map(|change| {
                let line = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => Edit::Context(line),
                    ChangeTag::Insert => Edit::Added(line),
                    ChangeTag::Delete => Edit::Removed(line),
                }
            })
            .collect();

        // unified diff numbers an empty side from the line before it
        let start = |range: &std::ops::Range<usize>| {
            if range.is_empty() { range.start } else { range.start + 1 }
        };

        hunks.push(Hunk {
            a_start: start(&a_range),
            a_size: a_range.len(),
            b_start: start(&b_range),
            b_size: b_range.len(),
            edits,
        });
    }

    LineDiff::Text(hunks)
}
