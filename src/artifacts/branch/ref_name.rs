use crate::artifacts::branch::{
    HEAD_REF_NAME, HEADS_PREFIX, INVALID_BRANCH_NAME_REGEX, MERGE_HEAD_REF_NAME, REMOTE_PREFIX,
    TAGS_PREFIX,
};
use crate::errors::{Error, Result};

/// A full ref name: `HEAD`, `MERGE_HEAD` or a path under `refs/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn head() -> Self {
        Self(HEAD_REF_NAME.to_string())
    }

    pub fn merge_head() -> Self {
        Self(MERGE_HEAD_REF_NAME.to_string())
    }

    pub fn branch(name: &str) -> Result<Self> {
        validate_short_name(name)?;
        Ok(Self(format!("{HEADS_PREFIX}{name}")))
    }

    pub fn tag(name: &str) -> Result<Self> {
        validate_short_name(name)?;
        Ok(Self(format!("{TAGS_PREFIX}{name}")))
    }

    pub fn remote(name: &str) -> Result<Self> {
        validate_short_name(name)?;
        Ok(Self(format!("{REMOTE_PREFIX}{name}")))
    }

    /// Accept `HEAD`, `MERGE_HEAD` or `refs/<valid path>`
    pub fn try_parse(name: &str) -> Result<Self> {
        if name == HEAD_REF_NAME || name == MERGE_HEAD_REF_NAME {
            return Ok(Self(name.to_string()));
        }

        match name.strip_prefix("refs/") {
            Some(rest) => {
                validate_short_name(rest)?;
                Ok(Self(name.to_string()))
            }
            None => Err(Error::InvalidRefName(name.to_string())),
        }
    }

    pub fn is_branch(&self) -> bool {
        self.0.starts_with(HEADS_PREFIX)
    }

    /// The name without its namespace prefix (`refs/heads/topic` -> `topic`)
    pub fn short_name(&self) -> &str {
        [HEADS_PREFIX, TAGS_PREFIX, REMOTE_PREFIX]
            .iter()
            .find_map(|prefix| self.0.strip_prefix(prefix))
            .unwrap_or(&self.0)
    }

    pub fn as_ref_path(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Branch, tag and remote names follow git's `check-ref-format` rules
pub fn validate_short_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRefName("ref name cannot be empty".to_string()));
    }

    let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
        .map_err(|e| Error::InvalidRefName(format!("invalid ref name regex: {e}")))?;

    if re.is_match(name) {
        Err(Error::InvalidRefName(name.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::proptest;

    proptest! {
        #[test]
        fn valid_branch_names_are_accepted(branch_name in "[a-zA-Z0-9_-]+") {
            assert!(RefName::branch(&branch_name).is_ok());
        }

        #[test]
        fn hierarchical_branch_names_are_accepted(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+"
        ) {
            let branch_name = format!("{}/{}", prefix, suffix);
            assert!(RefName::branch(&branch_name).is_ok());
        }

        #[test]
        fn names_starting_with_a_dot_are_rejected(suffix in "[a-zA-Z0-9_-]+") {
            let branch_name = format!(".{}", suffix);
            assert!(RefName::branch(&branch_name).is_err());
        }

        #[test]
        fn names_ending_with_lock_are_rejected(prefix in "[a-zA-Z0-9_-]+") {
            let branch_name = format!("{}.lock", prefix);
            assert!(RefName::tag(&branch_name).is_err());
        }

        #[test]
        fn consecutive_dots_are_rejected(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+"
        ) {
            let branch_name = format!("{}..{}", prefix, suffix);
            assert!(RefName::branch(&branch_name).is_err());
        }

        #[test]
        fn leading_or_trailing_slash_is_rejected(name in "[a-zA-Z0-9_-]+") {
            assert!(RefName::branch(&format!("/{}", name)).is_err());
            assert!(RefName::branch(&format!("{}/", name)).is_err());
        }

        #[test]
        fn revision_syntax_characters_are_rejected(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+",
            special_char in r"[\*:\?\[\\^~ ]"
        ) {
            let branch_name = format!("{}{}{}", prefix, special_char, suffix);
            assert!(RefName::branch(&branch_name).is_err());
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(RefName::branch(""), Err(Error::InvalidRefName(_))));
    }

    #[test]
    fn full_names_keep_their_namespace() {
        let branch = RefName::branch("feature/x").unwrap();
        assert_eq!(branch.as_ref(), "refs/heads/feature/x");
        assert_eq!(branch.short_name(), "feature/x");
        assert!(branch.is_branch());

        assert!(RefName::try_parse("HEAD").is_ok());
        assert!(RefName::try_parse("refs/tags/v1").is_ok());
        assert!(RefName::try_parse("heads/master").is_err());
        assert!(RefName::try_parse("refs/../HEAD").is_err());
    }
}
