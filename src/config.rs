//! Repository configuration
//!
//! Everything a [`Repository`](crate::areas::repository::Repository) needs to
//! know about its surroundings: who is committing, what the default branch is,
//! where the repository directory lives and which working-tree paths to skip.
//! The binary builds it from the environment; tests build it directly.

use crate::artifacts::objects::commit::Author;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_AUTHOR_NAME: &str = "kit";
pub const DEFAULT_AUTHOR_EMAIL: &str = "kit@localhost";
pub const DEFAULT_BRANCH: &str = "master";
pub const REPOSITORY_DIR: &str = ".kit";

/// Decides whether a working-tree path (relative to the root) is skipped
pub type IgnorePredicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Skip the repository directory and any `.git` directory
pub fn default_ignore(path: &Path) -> bool {
    path.components().any(|component| match component {
        std::path::Component::Normal(name) => name == REPOSITORY_DIR || name == ".git",
        _ => false,
    })
}

#[derive(Clone)]
pub struct Config {
    pub author_name: String,
    pub author_email: String,
    /// Fixed author date; `None` stamps commits with the current time
    pub author_date: Option<chrono::DateTime<chrono::FixedOffset>>,
    pub default_branch: String,
    pub repository_dir: String,
    pub ignore: IgnorePredicate,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
            author_date: None,
            default_branch: DEFAULT_BRANCH.to_string(),
            repository_dir: REPOSITORY_DIR.to_string(),
            ignore: Arc::new(default_ignore),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("author_name", &self.author_name)
            .field("author_email", &self.author_email)
            .field("author_date", &self.author_date)
            .field("default_branch", &self.default_branch)
            .field("repository_dir", &self.repository_dir)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Read `GIT_AUTHOR_NAME`, `GIT_AUTHOR_EMAIL` and `GIT_AUTHOR_DATE`
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|value| !value.trim().is_empty());
        let defaults = Config::default();

        Config {
            author_name: var("GIT_AUTHOR_NAME").unwrap_or(defaults.author_name),
            author_email: var("GIT_AUTHOR_EMAIL").unwrap_or(defaults.author_email),
            author_date: var("GIT_AUTHOR_DATE").and_then(|date| parse_author_date(&date)),
            ..defaults
        }
    }

    pub fn with_ignore(mut self, ignore: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.ignore = Arc::new(ignore);
        self
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        (self.ignore)(path)
    }

    /// The identity recorded as author and committer of new commits
    pub fn author(&self) -> Author {
        match self.author_date {
            Some(date) => {
                Author::new_with_timestamp(self.author_name.clone(), self.author_email.clone(), date)
            }
            None => Author::new(self.author_name.clone(), self.author_email.clone()),
        }
    }
}

/// Accepts RFC 2822, `YYYY-MM-DD HH:MM:SS +zzzz` and raw `<unix-ts> +zzzz`
fn parse_author_date(date: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    chrono::DateTime::parse_from_rfc2822(date)
        .or_else(|_| chrono::DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z"))
        .or_else(|_| chrono::DateTime::parse_from_str(date, "%s %z"))
        .ok()
}
