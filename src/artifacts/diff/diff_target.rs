use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use bytes::Bytes;

const NULL_OID: &str = "0000000";
const NULL_PATH: &str = "/dev/null";

/// Where the content of one side of a diff lives
#[derive(Clone, Copy)]
pub enum ContentSource<'r> {
    /// Stored blobs (a commit tree or the index)
    Database(&'r Database),
    /// Files as they are now
    Workspace(&'r Workspace),
}

/// One side of a file diff; `oid` is `None` when the file does not exist there
#[derive(Debug, Clone)]
pub struct DiffTarget {
    pub path: String,
    pub oid: Option<ObjectId>,
    pub content: Bytes,
}

impl DiffTarget {
    pub fn load(path: &str, oid: Option<&ObjectId>, source: ContentSource<'_>) -> Result<Self> {
        let content = match (oid, source) {
            (None, _) => Bytes::new(),
            (Some(oid), ContentSource::Database(database)) => database.load_blob(oid)?.into_content(),
            (Some(_), ContentSource::Workspace(workspace)) => workspace.read_file(path)?,
        };

        Ok(DiffTarget {
            path: path.to_string(),
            oid: oid.cloned(),
            content,
        })
    }

    /// `a/<path>` style header path, `/dev/null` for a missing side
    pub fn diff_path(&self, prefix: &str) -> String {
        match self.oid {
            Some(_) => format!("{prefix}/{}", self.path),
            None => NULL_PATH.to_string(),
        }
    }

    pub fn short_oid(&self) -> String {
        self.oid
            .as_ref()
            .map(ObjectId::to_short_oid)
            .unwrap_or_else(|| NULL_OID.to_string())
    }
}
