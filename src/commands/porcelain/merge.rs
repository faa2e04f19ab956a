use crate::areas::repository::Repository;
use crate::artifacts::merge::MergeOutcome;
use colored::Colorize;

impl Repository {
    pub fn merge_command(&self, revision: &str, message: Option<&str>) -> anyhow::Result<MergeOutcome> {
        let theirs = self.resolve_revision(revision)?;
        let message = match message.map(str::trim) {
            Some(message) if !message.is_empty() => format!("{message}\n"),
            _ => format!("Merge {revision}\n"),
        };

        let outcome = self.merge(&theirs, &message)?;

        match &outcome {
            MergeOutcome::UpToDate => writeln!(self.writer(), "Already up to date.")?,
            MergeOutcome::FastForward { from, to } => {
                writeln!(self.writer(), "Updating {}..{}", from.to_short_oid(), to.to_short_oid())?;
                writeln!(self.writer(), "Fast-forward")?;
            }
            MergeOutcome::Merged { commit } => {
                let merged = self.database().load_commit(commit)?;
                writeln!(
                    self.writer(),
                    "Merge made: [{}] {}",
                    commit.to_short_oid(),
                    merged.short_message()
                )?;
            }
            MergeOutcome::Conflicted { conflicts } => {
                for conflict in conflicts {
                    let line = format!("CONFLICT ({}): Merge conflict in {}", conflict.kind, conflict.path);
                    writeln!(self.writer(), "{}", line.red())?;
                }
                writeln!(
                    self.writer(),
                    "Automatic merge failed; fix conflicts and then commit the result."
                )?;
            }
        }

        Ok(outcome)
    }
}
