use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::branch::ref_name::{RefName, validate_short_name};
use crate::artifacts::branch::{
    ANCESTOR_REGEX, HEADS_PREFIX, PARENT_REGEX, REF_ALIASES, TAGS_PREFIX,
};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};

/// Shortest hex string accepted as an abbreviated object ID
const MIN_OID_PREFIX: usize = 4;

/// A revision expression identifying an object.
///
/// Supports:
/// - Ref names: `master`, `feature/x`, `HEAD`, `refs/tags/v1`
/// - Aliases: `@` (resolves to `HEAD`)
/// - Full or abbreviated OIDs: 4-40 hex characters, used when no ref matches
/// - Parent notation: `<revision>^`
/// - Ancestor notation: `<revision>~<n>`
///
/// A short name is looked up as given, then under `refs/`, `refs/tags/` and
/// `refs/heads/`. Several candidates pointing at different objects make the
/// name ambiguous. Fetched branches are reached as `remote/<name>` through
/// `refs/`, so they never shadow a local branch of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// A ref name or, failing that, an object ID
    Ref(String),
    /// The Nth first-parent ancestor of a revision (e.g. HEAD~3)
    Ancestor(Box<Revision>, usize),
    /// The first parent of a revision (e.g. HEAD^)
    Parent(Box<Revision>),
}

impl Revision {
    pub fn try_parse(revision: &str) -> Result<Revision> {
        let invalid = |e: regex::Error| Error::InvalidRefName(format!("invalid revision regex: {e}"));

        if let Some(caps) = regex::Regex::new(PARENT_REGEX)
            .map_err(invalid)?
            .captures(revision)
        {
            let base_revision = Self::try_parse(&caps[1])?;
            return Ok(Revision::Parent(Box::new(base_revision)));
        }

        if let Some(caps) = regex::Regex::new(ANCESTOR_REGEX)
            .map_err(invalid)?
            .captures(revision)
        {
            let generations = caps[2]
                .parse::<usize>()
                .map_err(|_| Error::InvalidRefName(revision.to_string()))?;
            let base_revision = Self::try_parse(&caps[1])?;
            return Ok(Revision::Ancestor(Box::new(base_revision), generations));
        }

        let resolved_name = *REF_ALIASES.get(revision).unwrap_or(&revision);
        validate_short_name(resolved_name)?;

        Ok(Revision::Ref(resolved_name.to_string()))
    }

    pub fn resolve(&self, refs: &Refs, database: &Database) -> Result<ObjectId> {
        match self {
            Revision::Ref(name) => Self::resolve_name(name, refs, database),
            Revision::Parent(base_revision) => {
                let oid = base_revision.resolve(refs, database)?;
                Self::first_parent(&oid, database)?
                    .ok_or_else(|| Error::RefNotFound(self.to_string()))
            }
            Revision::Ancestor(base_revision, generations) => {
                let mut oid = base_revision.resolve(refs, database)?;
                for _ in 0..*generations {
                    oid = Self::first_parent(&oid, database)?
                        .ok_or_else(|| Error::RefNotFound(self.to_string()))?;
                }

                Ok(oid)
            }
        }
    }

    fn first_parent(oid: &ObjectId, database: &Database) -> Result<Option<ObjectId>> {
        Ok(database.load_commit(oid)?.parent().cloned())
    }

    fn resolve_name(name: &str, refs: &Refs, database: &Database) -> Result<ObjectId> {
        let candidates = [
            name.to_string(),
            format!("refs/{name}"),
            format!("{TAGS_PREFIX}{name}"),
            format!("{HEADS_PREFIX}{name}"),
        ];

        let mut found: Vec<(RefName, ObjectId)> = Vec::new();
        for candidate in &candidates {
            let Ok(ref_name) = RefName::try_parse(candidate) else {
                continue;
            };
            if found.iter().any(|(seen, _)| seen == &ref_name) {
                continue;
            }
            if let Some(oid) = refs.try_resolve(&ref_name)? {
                found.push((ref_name, oid));
            }
        }

        if let Some((_, first_oid)) = found.first() {
            if found.iter().any(|(_, oid)| oid != first_oid) {
                return Err(Error::AmbiguousReference {
                    name: name.to_string(),
                    candidates: found.iter().map(|(ref_name, _)| ref_name.to_string()).collect(),
                });
            }

            return Ok(first_oid.clone());
        }

        if Self::looks_like_oid(name) {
            return Self::resolve_oid(name, database);
        }

        Err(Error::RefNotFound(name.to_string()))
    }

    fn resolve_oid(prefix: &str, database: &Database) -> Result<ObjectId> {
        if prefix.len() == OBJECT_ID_LENGTH {
            let oid = ObjectId::try_parse(prefix)?;
            return if database.contains(&oid) {
                Ok(oid)
            } else {
                Err(Error::ObjectNotFound(oid))
            };
        }

        let mut matches = database.find_objects_by_prefix(prefix)?;
        match matches.len() {
            0 => Err(Error::RefNotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousReference {
                name: prefix.to_string(),
                candidates: matches.iter().map(ObjectId::to_string).collect(),
            }),
        }
    }

    fn looks_like_oid(s: &str) -> bool {
        (MIN_OID_PREFIX..=OBJECT_ID_LENGTH).contains(&s.len())
            && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Ref(name) => write!(f, "{name}"),
            Revision::Parent(base) => write!(f, "{base}^"),
            Revision::Ancestor(base, generations) => write!(f, "{base}~{generations}"),
        }
    }
}
