#![allow(dead_code)]

pub mod command;
pub mod file;

use std::path::Path;

/// The object ID a ref file points at, following `ref:` indirection
pub fn resolve_ref(dir: &Path, name: &str) -> String {
    let content = std::fs::read_to_string(dir.join(".kit").join(name))
        .unwrap_or_else(|_| panic!("ref {name} should exist"));
    let content = content.trim();

    match content.strip_prefix("ref: ") {
        Some(target) => resolve_ref(dir, target),
        None => content.to_string(),
    }
}

pub fn head_oid(dir: &Path) -> String {
    resolve_ref(dir, "HEAD")
}

pub fn short(oid: &str) -> &str {
    &oid[..7]
}
