use crate::areas::repository::Repository;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::branch::{HEADS_PREFIX, REMOTE_PREFIX, TAGS_PREFIX};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub oneline: bool,
    /// Print at most this many commits
    pub max_count: Option<usize>,
}

impl Repository {
    /// History from `revisions` (HEAD when empty), first parents first
    pub fn log(&self, revisions: &[String], opts: &LogOptions) -> anyhow::Result<()> {
        let starts = if revisions.is_empty() {
            match self.refs().read_head()? {
                Some(head) => vec![head],
                None => anyhow::bail!("your current branch does not have any commits yet"),
            }
        } else {
            revisions
                .iter()
                .map(|revision| self.resolve_revision(revision))
                .collect::<Result<Vec<_>, _>>()?
        };

        let decorations = self.decorations()?;
        let limit = opts.max_count.unwrap_or(usize::MAX);

        for (position, oid) in self.iter_commits_and_parents(starts).take(limit).enumerate() {
            let oid = oid?;
            let commit = self.database().load_commit(&oid)?;
            let decoration = decorations.get(&oid).map(String::as_str).unwrap_or("");

            if opts.oneline {
                self.show_commit_oneline(&oid, &commit, decoration)?;
            } else {
                if position > 0 {
                    writeln!(self.writer())?;
                }
                self.show_commit_medium(&oid, &commit, decoration)?;
            }
        }

        Ok(())
    }

    fn show_commit_medium(&self, oid: &ObjectId, commit: &Commit, decoration: &str) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{}",
            format!("commit {oid}").yellow(),
            decoration
        )?;
        if commit.is_merge() {
            let parents = commit
                .parents()
                .iter()
                .map(ObjectId::to_short_oid)
                .collect::<Vec<_>>();
            writeln!(self.writer(), "Merge: {}", parents.join(" "))?;
        }
        writeln!(self.writer(), "Author: {}", commit.author().display_name())?;
        writeln!(self.writer(), "Date:   {}", commit.author().readable_timestamp())?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {message_line}")?;
        }

        Ok(())
    }

    fn show_commit_oneline(&self, oid: &ObjectId, commit: &Commit, decoration: &str) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{} {}",
            oid.to_short_oid().yellow(),
            decoration,
            commit.short_message()
        )?;

        Ok(())
    }

    /// ` (HEAD -> master, tag: v1)` per decorated commit
    fn decorations(&self) -> anyhow::Result<HashMap<ObjectId, String>> {
        let current = self.refs().current_branch()?;
        let mut names = HashMap::<ObjectId, Vec<String>>::new();

        if current.is_none()
            && let Some(head) = self.refs().read_head()?
        {
            names.entry(head).or_default().push("HEAD".to_string());
        }

        for (name, oid) in self.refs().list_refs("refs/")? {
            let label = Self::decoration_label(&name, current.as_ref());
            names.entry(oid).or_default().push(label);
        }

        Ok(names
            .into_iter()
            .map(|(oid, mut labels)| {
                labels.sort_by_key(|label| !label.starts_with("HEAD"));
                let joined = labels.join(", ");
                (oid, format!(" ({joined})").yellow().to_string())
            })
            .collect())
    }

    fn decoration_label(name: &RefName, current: Option<&RefName>) -> String {
        let full = name.as_ref();

        if current == Some(name) {
            format!("HEAD -> {}", name.short_name())
        } else if full.starts_with(TAGS_PREFIX) {
            format!("tag: {}", name.short_name())
        } else if full.starts_with(REMOTE_PREFIX) {
            format!("remote/{}", name.short_name())
        } else if full.starts_with(HEADS_PREFIX) {
            name.short_name().to_string()
        } else {
            full.to_string()
        }
    }
}
