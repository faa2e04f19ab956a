//! Commit object
//!
//! Commits link a tree snapshot to its parent commits plus metadata.
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;

/// Author or committer information
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create a new author stamped with the current time
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// "Name <email> timestamp timezone", as stored in the commit payload
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidObject(format!("invalid author line: {reason}"));

        // "name <email> timestamp timezone", split from the right
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(invalid("too few fields"));
        }

        let timezone = parts[0];
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| invalid("bad timestamp"))?;
        let name_email_part = parts[2];

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| invalid("missing '<'"))?;
        let email_end = name_email_part
            .rfind('>')
            .ok_or_else(|| invalid("missing '>'"))?;
        if email_end < email_start {
            return Err(invalid("misplaced '>'"));
        }

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let offset = parse_timezone(timezone).ok_or_else(|| invalid("bad timezone"))?;
        let datetime = chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| invalid("timestamp out of range"))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp: datetime,
        })
    }
}

/// "+0200" / "-0530" to a fixed offset
fn parse_timezone(timezone: &str) -> Option<chrono::FixedOffset> {
    if timezone.len() != 5 || !timezone.is_ascii() {
        return None;
    }

    let sign = match &timezone[..1] {
        "+" => 1,
        "-" => -1,
        _ => return None,
    };
    let hours = timezone[1..3].parse::<i32>().ok()?;
    let minutes = timezone[3..5].parse::<i32>().ok()?;

    chrono::FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Commit object
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for a root commit, two for a merge commit)
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    /// Create a new commit; the author doubles as committer
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            author: author.clone(),
            committer: author,
            message,
        }
    }

    /// First line of the message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.author.timestamp()
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(format!("committer {}", self.committer.display()));

        lines
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = self.header_lines().join("\n");
        content.push_str("\n\n");
        content.push_str(&self.message);

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(payload: &[u8]) -> Result<Self> {
        let content = std::str::from_utf8(payload)
            .map_err(|_| Error::InvalidObject("commit is not UTF-8".to_string()))?;

        let (headers, message) = content
            .split_once("\n\n")
            .ok_or_else(|| Error::InvalidObject("commit has no message separator".to_string()))?;

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| Error::InvalidObject(format!("invalid commit line {line:?}")))?;

            match key {
                "tree" => tree_oid = Some(ObjectId::try_parse(value)?),
                "parent" => parents.push(ObjectId::try_parse(value)?),
                "author" => author = Some(Author::try_from(value)?),
                "committer" => committer = Some(Author::try_from(value)?),
                _ => {
                    return Err(Error::InvalidObject(format!(
                        "unknown commit field {key}"
                    )));
                }
            }
        }

        let tree_oid =
            tree_oid.ok_or_else(|| Error::InvalidObject("commit has no tree".to_string()))?;
        let author =
            author.ok_or_else(|| Error::InvalidObject("commit has no author".to_string()))?;
        let committer = committer.unwrap_or_else(|| author.clone());

        Ok(Commit {
            parents,
            tree_oid,
            author,
            committer,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines.join("\n")
    }
}
