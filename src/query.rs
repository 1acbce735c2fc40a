//! Repository query parsing and validation

use crate::error::{ReputerError, ReputerResult};

const REPO_NAME_PARTS: usize = 3;

/// A reputation query for one repository, optionally ending at a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Repo URI without scheme, e.g. `github.com/owner/repo`
    pub repo: String,
    /// Commit (inclusive) at which the history walk starts; empty = default branch
    pub commit: String,
    /// Keep raw signals and context in the report
    pub stats: bool,
    /// Provider host parsed from `repo` (e.g. `github.com`)
    pub kind: String,
    /// Repository owner parsed from `repo`
    pub owner: String,
    /// Repository name parsed from `repo`
    pub name: String,
}

impl Query {
    /// Parse a repo URI such as `https://github.com/owner/repo`.
    pub fn parse(repo: &str, commit: &str, stats: bool) -> ReputerResult<Self> {
        let repo = repo.trim();
        if repo.is_empty() {
            return Err(ReputerError::InvalidQuery("repo must be specified".into()));
        }

        let repo = repo
            .strip_prefix("https://")
            .or_else(|| repo.strip_prefix("http://"))
            .unwrap_or(repo);

        let parts: Vec<&str> = repo.split('/').collect();
        if parts.len() != REPO_NAME_PARTS {
            return Err(ReputerError::InvalidQuery(format!(
                "invalid format: {} (expected host/owner/name)",
                repo
            )));
        }

        Ok(Self {
            repo: repo.to_string(),
            commit: commit.trim().to_string(),
            stats,
            kind: parts[0].to_string(),
            owner: parts[1].to_string(),
            name: parts[2].to_string(),
        })
    }

    /// Check that every required field is populated.
    pub fn validate(&self) -> ReputerResult<()> {
        let required = [
            ("repo", &self.repo),
            ("kind", &self.kind),
            ("owner", &self.owner),
            ("name", &self.name),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ReputerError::InvalidQuery(format!(
                    "{} must be specified",
                    field
                )));
            }
        }
        Ok(())
    }

    /// The commit to start from, if one was given
    pub fn commit(&self) -> Option<&str> {
        Some(self.commit.as_str()).filter(|c| !c.is_empty())
    }

    /// `owner/name` path used by provider APIs
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.commit() {
            Some(c) => write!(f, "{}@{}", self.repo, c),
            None => write!(f, "{}", self.repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_uri() {
        let q = Query::parse("github.com/owner/repo", "abc123", true).unwrap();
        assert_eq!(q.kind, "github.com");
        assert_eq!(q.owner, "owner");
        assert_eq!(q.name, "repo");
        assert_eq!(q.commit(), Some("abc123"));
        assert!(q.stats);
    }

    #[test]
    fn test_parse_strips_scheme() {
        for uri in ["https://github.com/owner/repo", "http://github.com/owner/repo"] {
            let q = Query::parse(uri, "", false).unwrap();
            assert_eq!(q.repo, "github.com/owner/repo");
            assert_eq!(q.kind, "github.com");
            assert_eq!(q.slug(), "owner/repo");
            assert_eq!(q.commit(), None);
        }
    }

    #[test]
    fn test_parse_rejects_wrong_part_count() {
        for uri in ["github.com/owner", "github.com/owner/repo/extra"] {
            let err = Query::parse(uri, "", false).unwrap_err();
            assert!(err.to_string().contains("invalid format"), "{}", err);
        }
    }

    #[test]
    fn test_parse_rejects_empty_repo() {
        let err = Query::parse("", "", false).unwrap_err();
        assert!(err.to_string().contains("repo must be specified"));
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let cases = [
            (Query::default(), "repo must be specified"),
            (
                Query {
                    repo: "r".into(),
                    ..Default::default()
                },
                "kind must be specified",
            ),
            (
                Query {
                    repo: "r".into(),
                    kind: "k".into(),
                    ..Default::default()
                },
                "owner must be specified",
            ),
            (
                Query {
                    repo: "r".into(),
                    kind: "k".into(),
                    owner: "o".into(),
                    ..Default::default()
                },
                "name must be specified",
            ),
        ];
        for (q, msg) in cases {
            let err = q.validate().unwrap_err();
            assert!(err.to_string().contains(msg), "{} vs {}", err, msg);
        }
    }

    #[test]
    fn test_validate_parsed_query() {
        let q = Query::parse("gitlab.com/o/n", "", false).unwrap();
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_display_includes_commit() {
        let q = Query::parse("github.com/o/n", "deadbeef", false).unwrap();
        assert_eq!(q.to_string(), "github.com/o/n@deadbeef");
    }
}
