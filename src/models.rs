//! Core data models for Reputer
//!
//! These models carry per-author evidence through the pipeline and make up
//! the emitted report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw per-author evidence used as scoring input.
///
/// Created by the collector the first time a login is seen, filled with
/// profile fields by exactly one enrichment task, then scored once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// Account suspended at the provider (forces a zero score)
    #[serde(default)]
    pub suspended: bool,
    /// Two-factor or stronger authentication enabled
    #[serde(default)]
    pub strong_auth: bool,
    /// Commits attributed to this author in the queried range
    #[serde(default)]
    pub commits: i64,
    /// Commits without a provider-verified signature (never exceeds `commits`)
    #[serde(default)]
    pub unverified_commits: i64,
    /// Every commit in range is verified. Informational, never scored.
    #[serde(default)]
    pub verified_commits: bool,
    /// Account age in whole days
    #[serde(default)]
    pub age_days: i64,
    /// Member of the repository owner's organization
    #[serde(default)]
    pub org_member: bool,
    /// Days since the author's most recent commit in range (0 = today or unknown)
    #[serde(default)]
    pub last_commit_days: i64,
    #[serde(default)]
    pub followers: i64,
    #[serde(default)]
    pub following: i64,
    #[serde(default)]
    pub public_repos: i64,
    #[serde(default)]
    pub private_repos: i64,
}

impl Signals {
    /// Record one commit, counting it as unverified unless the provider
    /// explicitly marked it verified.
    pub fn record_commit(&mut self, verified: Option<bool>) {
        self.commits += 1;
        if verified != Some(true) {
            self.unverified_commits += 1;
        }
        self.verified_commits = self.unverified_commits == 0;
    }
}

/// Corpus-wide totals shared read-only by every scoring call in a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cohort {
    pub total_commits: i64,
    pub total_contributors: usize,
}

impl Cohort {
    pub fn new(total_commits: i64, total_contributors: usize) -> Self {
        Self {
            total_commits,
            total_contributors,
        }
    }
}

/// Informational author metadata. Never used for scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorContext {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub company: String,
}

/// A commit author with its final reputation score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub reputation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<AuthorContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Signals>,
}

impl Author {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            reputation: 0.0,
            context: Some(AuthorContext::default()),
            stats: Some(Signals::default()),
        }
    }

    /// Drop the raw evidence, keeping only the username and score.
    pub fn redact(&mut self) {
        self.context = None;
        self.stats = None;
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.2})", self.username, self.reputation)
    }
}

/// Name and weight of one scoring category, echoed in reports for auditability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub name: String,
    pub weight: f64,
}

/// Scoring model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub model_version: String,
    pub categories: Vec<CategoryWeight>,
}

impl Meta {
    /// Metadata describing the current scoring model
    pub fn current() -> Self {
        Self {
            model_version: crate::scoring::MODEL_VERSION.to_string(),
            categories: crate::scoring::categories(),
        }
    }
}

/// Reputation report for one repository at one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub repo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub at_commit: String,
    pub generated_on: DateTime<Utc>,
    pub total_commits: i64,
    pub total_contributors: i64,
    pub meta: Meta,
    #[serde(default)]
    pub contributors: Vec<Author>,
}

impl Report {
    /// Sort contributors by username so output is independent of
    /// enrichment completion order.
    pub fn sort_authors(&mut self) {
        self.contributors.sort_by(|a, b| a.username.cmp(&b.username));
    }

    /// Look up a contributor by username
    pub fn author(&self, username: &str) -> Option<&Author> {
        self.contributors.iter().find(|a| a.username == username)
    }
}
