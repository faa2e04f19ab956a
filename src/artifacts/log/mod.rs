//! Commit graph traversal
//!
//! - `rev_list`: ancestry sets, history walks and ancestor checks
//!
//! Every walk takes a parent loader (`Fn(&ObjectId) -> Result<Vec<ObjectId>>`)
//! instead of a database, so the same code runs over on-disk commits and
//! in-memory test graphs.

pub mod rev_list;
