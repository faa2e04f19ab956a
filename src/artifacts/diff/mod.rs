//! Tree and content comparison
//!
//! - `tree_diff`: which paths changed between two flat trees
//! - `line_diff`: what changed inside a file, as unified hunks
//! - `diff_target`: the content on either side of a file diff
//!
//! Tree diffs drive status, diff and the merge engine; line diffs are only
//! rendered for display.

pub mod diff_target;
pub mod line_diff;
pub mod tree_diff;
