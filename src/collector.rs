//! Commit history collection
//!
//! Walks a provider's paginated commit listing (newest first) and folds each
//! commit into per-author [`Signals`]. The walk is strictly sequential: one
//! page in flight, no prefetching.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{ReputerError, ReputerResult};
use crate::models::{Cohort, Signals};
use crate::provider::{Backoff, CommitSummary, Provider};
use crate::query::Query;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Authors discovered in a commit range plus the global commit count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub authors: HashMap<String, Signals>,
    /// Every commit seen, including ones without an author
    pub total_commits: i64,
}

impl Collection {
    pub fn cohort(&self) -> Cohort {
        Cohort::new(self.total_commits, self.authors.len())
    }

    fn record(&mut self, commit: &CommitSummary, now: DateTime<Utc>) {
        self.total_commits += 1;

        let Some(login) = commit.author_login.as_deref() else {
            return;
        };

        let first_seen = !self.authors.contains_key(login);
        let signals = self.authors.entry(login.to_string()).or_default();
        signals.record_commit(commit.verified);

        // Newest first: the first commit seen is the author's most recent
        if first_seen {
            if let Some(at) = commit.committed_at {
                signals.last_commit_days = days_since(at, now);
            }
        }
    }
}

/// Whole days from `then` to `now`, rounded up, never negative
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let hours = now.signed_duration_since(then).num_seconds() as f64 / 3600.0;
    ((hours / 24.0).ceil() as i64).max(0)
}

/// Sequential paginated commit walker
#[derive(Debug, Clone)]
pub struct Collector {
    page_size: u32,
    backoff: Backoff,
    now: Option<DateTime<Utc>>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, Backoff::default())
    }
}

impl Collector {
    pub fn new(page_size: u32, backoff: Backoff) -> Self {
        Self {
            page_size: page_size.max(1),
            backoff,
            now: None,
        }
    }

    /// Pin the reference time used for recency (defaults to the walk start)
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Walk all pages for `query`. Any page failure aborts the walk.
    pub fn collect(&self, provider: &dyn Provider, query: &Query) -> ReputerResult<Collection> {
        let now = self.now.unwrap_or_else(Utc::now);
        let mut collection = Collection::default();
        let mut page: u32 = 1;

        loop {
            let response = provider
                .list_commits(query, page, self.page_size)
                .map_err(|source| ReputerError::Collection {
                    repo: query.to_string(),
                    page,
                    source,
                })?;

            let count = response.data.len();
            for commit in &response.data {
                collection.record(commit, now);
            }

            debug!(
                page,
                commits = count,
                total = collection.total_commits,
                authors = collection.authors.len(),
                "commit page"
            );

            self.backoff.wait(&response.rate);
            if count < self.page_size as usize {
                break;
            }
            page += 1;
        }

        Ok(collection)
    }
}
