//! Reference names and revision parsing
//!
//! - `ref_name`: validated full ref names (`HEAD`, `refs/heads/<b>`, ...)
//! - `revision`: revision expressions (`@`, names, OIDs, `^`, `~n`)

pub mod ref_name;
pub mod revision;

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";
pub const PARENT_REGEX: &str = r"^(.+)\^$";
pub const ANCESTOR_REGEX: &str = r"^(.+)\~(\d+)$";
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};

pub const HEAD_REF_NAME: &str = "HEAD";
pub const MERGE_HEAD_REF_NAME: &str = "MERGE_HEAD";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";
pub const REMOTE_PREFIX: &str = "refs/remote/";
