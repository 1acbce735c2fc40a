//! Report orchestration: validate, dispatch, collect, enrich, assemble

use crate::collector::Collector;
use crate::config::{UserConfig, DEFAULT_CONCURRENCY, DEFAULT_PAGE_SIZE};
use crate::enricher::Enricher;
use crate::error::{ReputerError, ReputerResult};
use crate::models::{Meta, Report};
use crate::provider::{Backoff, Provider, ProviderRegistry};
use crate::query::Query;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Tuning knobs for one [`Reputer`]
#[derive(Debug, Clone)]
pub struct ReputerOptions {
    pub page_size: u32,
    pub concurrency: usize,
    pub backoff: Backoff,
    /// Fixed evaluation time; `None` uses the wall clock per report
    pub now: Option<DateTime<Utc>>,
}

impl Default for ReputerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            backoff: Backoff::default(),
            now: None,
        }
    }
}

impl ReputerOptions {
    pub fn from_config(config: &UserConfig) -> Self {
        Self {
            page_size: config.page_size(),
            concurrency: config.concurrency(),
            backoff: config.backoff(),
            now: None,
        }
    }
}

/// Produces reputation reports using providers from a registry
pub struct Reputer<'a> {
    registry: &'a ProviderRegistry,
    options: ReputerOptions,
}

impl<'a> Reputer<'a> {
    pub fn new(registry: &'a ProviderRegistry, options: ReputerOptions) -> Self {
        Self { registry, options }
    }

    /// Build the report for `query`. Any collection or enrichment failure
    /// fails the whole report.
    pub fn report(&self, query: &Query) -> ReputerResult<Report> {
        let start = Instant::now();
        query.validate()?;

        let provider: &dyn Provider = self
            .registry
            .get(&query.kind)
            .map(Arc::as_ref)
            .ok_or_else(|| ReputerError::UnsupportedProvider(query.kind.clone()))?;
        provider.check().map_err(|source| ReputerError::Provider {
            provider: provider.name().to_string(),
            source,
        })?;

        let now = self.options.now.unwrap_or_else(Utc::now);
        debug!(query = %query, provider = provider.name(), "building report");

        let collection = Collector::new(self.options.page_size, self.options.backoff.clone())
            .with_now(now)
            .collect(provider, query)?;
        let cohort = collection.cohort();

        let contributors = Enricher::new(self.options.concurrency, self.options.backoff.clone())
            .with_now(now)
            .enrich(
                provider,
                collection.authors,
                cohort,
                &query.owner,
                query.stats,
            )?;

        let mut report = Report {
            repo: query.repo.clone(),
            at_commit: query.commit.clone(),
            generated_on: now,
            total_commits: cohort.total_commits,
            total_contributors: cohort.total_contributors as i64,
            meta: Meta::current(),
            contributors,
        };
        report.sort_authors();

        info!(
            repo = %query,
            commits = report.total_commits,
            contributors = report.total_contributors,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "report complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ApiResponse, CommitSummary, ProviderError, ProviderResult, UserProfile};

    struct StaticProvider {
        commits: Vec<CommitSummary>,
        token: bool,
    }

    impl Provider for StaticProvider {
        fn name(&self) -> &'static str {
            "static"
        }

        fn check(&self) -> ProviderResult<()> {
            if self.token {
                Ok(())
            } else {
                Err(ProviderError::MissingToken {
                    env_var: "STATIC_TOKEN",
                    config_hint: "[static] token".into(),
                })
            }
        }

        fn list_commits(
            &self,
            _query: &Query,
            page: u32,
            _per_page: u32,
        ) -> ProviderResult<ApiResponse<Vec<CommitSummary>>> {
            let data = if page == 1 { self.commits.clone() } else { vec![] };
            Ok(ApiResponse::unmetered(data))
        }

        fn get_user(&self, login: &str) -> ProviderResult<ApiResponse<UserProfile>> {
            Ok(ApiResponse::unmetered(UserProfile {
                login: login.to_string(),
                ..Default::default()
            }))
        }

        fn is_org_member(&self, _org: &str, _login: &str) -> ProviderResult<ApiResponse<bool>> {
            Ok(ApiResponse::unmetered(false))
        }
    }

    fn commit(login: &str) -> CommitSummary {
        CommitSummary {
            sha: "s".into(),
            author_login: Some(login.into()),
            verified: Some(true),
            committed_at: None,
        }
    }

    fn registry(token: bool) -> ProviderRegistry {
        let provider = StaticProvider {
            commits: vec![commit("zed"), commit("amy"), commit("max"), commit("amy")],
            token,
        };
        ProviderRegistry::new().with("example.com", Arc::new(provider))
    }

    #[test]
    fn test_report_sorted_and_counted() {
        let registry = registry(true);
        let query = Query::parse("example.com/org/repo", "abc", true).unwrap();
        let report = Reputer::new(&registry, ReputerOptions::default())
            .report(&query)
            .unwrap();

        let names: Vec<_> = report.contributors.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["amy", "max", "zed"]);
        assert_eq!(report.total_commits, 4);
        assert_eq!(report.total_contributors, 3);
        assert_eq!(report.at_commit, "abc");
        assert_eq!(report.meta.model_version, crate::scoring::MODEL_VERSION);
        assert_eq!(report.author("amy").unwrap().stats.as_ref().unwrap().commits, 2);
    }

    #[test]
    fn test_unsupported_provider() {
        let registry = registry(true);
        let query = Query::parse("bitbucket.org/o/r", "", false).unwrap();
        let err = Reputer::new(&registry, ReputerOptions::default())
            .report(&query)
            .unwrap_err();
        assert!(matches!(err, ReputerError::UnsupportedProvider(ref k) if k == "bitbucket.org"));
    }

    #[test]
    fn test_invalid_query() {
        let registry = registry(true);
        let err = Reputer::new(&registry, ReputerOptions::default())
            .report(&Query::default())
            .unwrap_err();
        assert!(matches!(err, ReputerError::InvalidQuery(_)));
    }

    #[test]
    fn test_missing_credentials() {
        let registry = registry(false);
        let query = Query::parse("example.com/o/r", "", false).unwrap();
        let err = Reputer::new(&registry, ReputerOptions::default())
            .report(&query)
            .unwrap_err();
        assert!(err.to_string().contains("STATIC_TOKEN"), "{}", err);
    }

    #[test]
    fn test_fixed_clock_sets_generated_on() {
        let registry = registry(true);
        let now = Utc::now() - chrono::Duration::days(1);
        let options = ReputerOptions {
            now: Some(now),
            ..Default::default()
        };
        let query = Query::parse("example.com/o/r", "", false).unwrap();
        let report = Reputer::new(&registry, options).report(&query).unwrap();
        assert_eq!(report.generated_on, now);
        assert!(report.contributors.iter().all(|a| a.stats.is_none()));
    }
}
