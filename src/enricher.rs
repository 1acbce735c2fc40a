//! Parallel author enrichment using crossbeam channels
//!
//! Every distinct author found by the collector becomes one task: fetch the
//! profile, check owner-org membership, then score.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  task queue  │  (login, Signals) per author
//!                 └──────┬───────┘
//!            ┌───────────┼───────────┐
//!            ▼           ▼           ▼
//!     ┌──────────┐ ┌──────────┐ ┌──────────┐
//!     │ Worker 1 │ │ Worker 2 │ │ Worker N │  N = min(concurrency, authors)
//!     └────┬─────┘ └────┬─────┘ └────┬─────┘
//!          └────────────┼────────────┘
//!                       │ result channel (fan-in)
//!                       ▼
//!                ┌──────────────┐
//!                │    caller    │  collects authors or the first error
//!                └──────────────┘
//! ```
//!
//! The first hard failure raises a shared cancellation flag. Workers check it
//! before each task and between provider calls, so pending work is dropped
//! and the whole call fails. Completed authors are discarded in that case.

use crate::collector::days_since;
use crate::config::DEFAULT_CONCURRENCY;
use crate::error::{ReputerError, ReputerResult};
use crate::models::{Author, AuthorContext, Cohort, Signals};
use crate::provider::{Backoff, Provider, UserProfile};
use crate::scoring;
use chrono::{DateTime, SecondsFormat, Utc};
use crossbeam_channel::unbounded;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::debug;

/// Bounded worker pool that turns raw signals into scored authors
#[derive(Debug, Clone)]
pub struct Enricher {
    concurrency: usize,
    backoff: Backoff,
    now: Option<DateTime<Utc>>,
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY, Backoff::default())
    }
}

/// Inputs shared read-only by every task of one enrichment call
struct TaskContext<'a> {
    provider: &'a dyn Provider,
    cohort: Cohort,
    org: &'a str,
    include_stats: bool,
    now: DateTime<Utc>,
    cancelled: &'a AtomicBool,
}

impl Enricher {
    pub fn new(concurrency: usize, backoff: Backoff) -> Self {
        Self {
            concurrency: concurrency.max(1),
            backoff,
            now: None,
        }
    }

    /// Pin the reference time used for account age
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Enrich and score every author. Output order is unspecified.
    pub fn enrich(
        &self,
        provider: &dyn Provider,
        authors: HashMap<String, Signals>,
        cohort: Cohort,
        org: &str,
        include_stats: bool,
    ) -> ReputerResult<Vec<Author>> {
        let total = authors.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let num_workers = self.concurrency.min(total);

        let (task_tx, task_rx) = unbounded::<(String, Signals)>();
        for task in authors {
            // Receiver is alive in this scope, send cannot fail
            let _ = task_tx.send(task);
        }
        drop(task_tx);

        let (result_tx, result_rx) = unbounded::<ReputerResult<Author>>();
        let cancelled = AtomicBool::new(false);
        let ctx = TaskContext {
            provider,
            cohort,
            org,
            include_stats,
            now: self.now.unwrap_or_else(Utc::now),
            cancelled: &cancelled,
        };

        debug!(authors = total, workers = num_workers, "enriching authors");

        thread::scope(|scope| {
            let handles: Vec<_> = (0..num_workers)
                .map(|_| {
                    let rx = task_rx.clone();
                    let tx = result_tx.clone();
                    let ctx = &ctx;
                    scope.spawn(move || {
                        for (login, signals) in rx {
                            if ctx.cancelled.load(Ordering::SeqCst) {
                                break;
                            }
                            let result = self.enrich_one(ctx, login, signals);
                            let failed =
                                matches!(&result, Err(e) if !matches!(e, ReputerError::Cancelled));
                            if failed {
                                ctx.cancelled.store(true, Ordering::SeqCst);
                            }
                            if tx.send(result).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();

            // Only workers hold senders now, so the fan-in ends when they do
            drop(result_tx);

            let mut enriched = Vec::with_capacity(total);
            let mut first_error = None;
            for result in result_rx {
                match result {
                    Ok(author) => enriched.push(author),
                    Err(ReputerError::Cancelled) => {}
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            let mut panicked = false;
            for handle in handles {
                panicked |= handle.join().is_err();
            }

            if let Some(e) = first_error {
                return Err(e);
            }
            if panicked {
                return Err(ReputerError::WorkerPanicked);
            }
            Ok(enriched)
        })
    }

    fn enrich_one(
        &self,
        ctx: &TaskContext<'_>,
        login: String,
        mut signals: Signals,
    ) -> ReputerResult<Author> {
        let response = ctx
            .provider
            .get_user(&login)
            .map_err(|source| ReputerError::Enrichment {
                login: login.clone(),
                source,
            })?;
        self.backoff.wait(&response.rate);

        if ctx.cancelled.load(Ordering::SeqCst) {
            return Err(ReputerError::Cancelled);
        }

        let context = apply_profile(&mut signals, response.data, ctx.now);
        signals.org_member = self.is_org_member(ctx.provider, ctx.org, &login);

        let reputation = scoring::compute(&signals, ctx.cohort);
        debug!(login = %login, reputation, "author scored");

        let mut author = Author {
            username: login,
            reputation,
            context: Some(context),
            stats: Some(signals),
        };
        if !ctx.include_stats {
            author.redact();
        }
        Ok(author)
    }

    /// Membership failures degrade to "not a member" and never fail the task.
    fn is_org_member(&self, provider: &dyn Provider, org: &str, login: &str) -> bool {
        match provider.is_org_member(org, login) {
            Ok(response) => {
                self.backoff.wait(&response.rate);
                response.data
            }
            Err(e) => {
                debug!(
                    org,
                    login,
                    error = %e,
                    "org membership check failed, treating as non-member"
                );
                if let Some(rate) = e.rate() {
                    self.backoff.wait(&rate);
                }
                false
            }
        }
    }
}

/// Copy profile fields into `signals` and return the informational context
fn apply_profile(signals: &mut Signals, profile: UserProfile, now: DateTime<Utc>) -> AuthorContext {
    signals.suspended = profile.suspended_at.is_some();
    signals.strong_auth = profile.strong_auth;
    signals.followers = profile.followers;
    signals.following = profile.following;
    signals.public_repos = profile.public_repos;
    signals.private_repos = profile.private_repos;
    signals.age_days = profile
        .created_at
        .map(|created| days_since(created, now))
        .unwrap_or(0);

    AuthorContext {
        created: profile
            .created_at
            .map(|c| c.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default(),
        name: profile.name.unwrap_or_default(),
        email: profile.email.unwrap_or_default(),
        company: profile.company.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ApiResponse, CommitSummary, ProviderError, ProviderResult, RateLimit};
    use crate::query::Query;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeProvider {
        profiles: HashMap<String, UserProfile>,
        members: HashSet<String>,
        fail_user: Option<String>,
        fail_membership: bool,
        membership_quota_exhausted: Option<RateLimit>,
        panic_user: Option<String>,
        rate: RateLimit,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        user_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn track<T>(&self, f: impl FnOnce() -> T) -> T {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            let out = f();
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            out
        }
    }

    impl Provider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn list_commits(
            &self,
            _query: &Query,
            _page: u32,
            _per_page: u32,
        ) -> ProviderResult<ApiResponse<Vec<CommitSummary>>> {
            Ok(ApiResponse::unmetered(vec![]))
        }

        fn get_user(&self, login: &str) -> ProviderResult<ApiResponse<UserProfile>> {
            self.user_calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_user.as_deref() == Some(login) {
                panic!("boom");
            }
            self.track(|| {
                if self.fail_user.as_deref() == Some(login) {
                    return Err(ProviderError::Api {
                        url: format!("test://users/{login}"),
                        status: 500,
                        message: "server error".into(),
                        rate: RateLimit::default(),
                    });
                }
                let profile = self.profiles.get(login).cloned().unwrap_or(UserProfile {
                    login: login.to_string(),
                    ..Default::default()
                });
                Ok(ApiResponse::new(profile, self.rate))
            })
        }

        fn is_org_member(&self, _org: &str, login: &str) -> ProviderResult<ApiResponse<bool>> {
            if let Some(rate) = self.membership_quota_exhausted {
                return Err(ProviderError::Api {
                    url: "test://members".into(),
                    status: 403,
                    message: "API rate limit exceeded".into(),
                    rate,
                });
            }
            if self.fail_membership {
                return Err(ProviderError::Transport {
                    url: "test://members".into(),
                    message: "connection reset".into(),
                });
            }
            Ok(ApiResponse::new(self.members.contains(login), self.rate))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn authors(names: &[&str]) -> HashMap<String, Signals> {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    Signals {
                        commits: 1,
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    fn enricher(concurrency: usize) -> Enricher {
        Enricher::new(concurrency, Backoff::default()).with_now(now())
    }

    #[test]
    fn test_empty_input() {
        let provider = FakeProvider::default();
        let got = enricher(4)
            .enrich(&provider, HashMap::new(), Cohort::new(0, 0), "o", true)
            .unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_profile_fields_and_context() {
        let mut provider = FakeProvider::default();
        provider.profiles.insert(
            "alice".into(),
            UserProfile {
                login: "alice".into(),
                strong_auth: true,
                followers: 12,
                following: 3,
                public_repos: 4,
                private_repos: 2,
                created_at: Some(now() - chrono::Duration::days(365)),
                name: Some("Alice".into()),
                company: Some("Acme".into()),
                ..Default::default()
            },
        );
        provider.members.insert("alice".into());

        let got = enricher(2)
            .enrich(&provider, authors(&["alice"]), Cohort::new(1, 1), "o", true)
            .unwrap();
        let alice = &got[0];
        let stats = alice.stats.as_ref().unwrap();
        assert!(stats.strong_auth);
        assert!(stats.org_member);
        assert!(!stats.suspended);
        assert_eq!(stats.age_days, 365);
        assert_eq!(stats.followers, 12);
        assert_eq!(stats.private_repos, 2);
        assert_eq!(stats.commits, 1);

        let context = alice.context.as_ref().unwrap();
        assert_eq!(context.name, "Alice");
        assert_eq!(context.company, "Acme");
        assert_eq!(context.created, "2023-06-02T00:00:00Z");
        assert!(alice.reputation > 0.0);
        assert_eq!(alice.reputation, scoring::compute(stats, Cohort::new(1, 1)));
    }

    #[test]
    fn test_suspended_author_scores_zero() {
        let mut provider = FakeProvider::default();
        provider.profiles.insert(
            "gone".into(),
            UserProfile {
                login: "gone".into(),
                suspended_at: Some(now()),
                strong_auth: true,
                ..Default::default()
            },
        );
        let got = enricher(1)
            .enrich(&provider, authors(&["gone"]), Cohort::new(1, 1), "o", true)
            .unwrap();
        assert_eq!(got[0].reputation, 0.0);
        assert!(got[0].stats.as_ref().unwrap().suspended);
    }

    #[test]
    fn test_stats_dropped_when_not_requested() {
        let provider = FakeProvider::default();
        let got = enricher(2)
            .enrich(&provider, authors(&["a", "b"]), Cohort::new(2, 2), "o", false)
            .unwrap();
        assert_eq!(got.len(), 2);
        for author in got {
            assert!(author.stats.is_none());
            assert!(author.context.is_none());
            assert!(author.reputation > 0.0);
        }
    }

    #[test]
    fn test_org_membership_failure_degrades_to_false() {
        let provider = FakeProvider {
            fail_membership: true,
            ..Default::default()
        };
        let got = enricher(2)
            .enrich(&provider, authors(&["a", "b", "c"]), Cohort::new(3, 3), "o", true)
            .unwrap();
        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|a| !a.stats.as_ref().unwrap().org_member));
    }

    #[test]
    fn test_profile_failure_fails_whole_call() {
        let names: Vec<String> = (0..20).map(|i| format!("user{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let provider = FakeProvider {
            fail_user: Some("user7".into()),
            ..Default::default()
        };
        let err = enricher(4)
            .enrich(&provider, authors(&refs), Cohort::new(20, 20), "o", true)
            .unwrap_err();
        match err {
            ReputerError::Enrichment { login, .. } => assert_eq!(login, "user7"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failure_stops_pending_tasks() {
        let names: Vec<String> = (0..50).map(|i| format!("user{i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let provider = FailingProvider(FakeProvider::default());
        let result = enricher(1).enrich(&provider, authors(&refs), Cohort::new(50, 50), "o", true);
        assert!(matches!(result, Err(ReputerError::Enrichment { .. })));
        // A single worker stops after its first failure
        assert_eq!(provider.0.user_calls.load(Ordering::SeqCst), 1);
    }

    struct FailingProvider(FakeProvider);

    impl Provider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn list_commits(
            &self,
            query: &Query,
            page: u32,
            per_page: u32,
        ) -> ProviderResult<ApiResponse<Vec<CommitSummary>>> {
            self.0.list_commits(query, page, per_page)
        }

        fn get_user(&self, login: &str) -> ProviderResult<ApiResponse<UserProfile>> {
            self.0.user_calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Api {
                url: format!("test://users/{login}"),
                status: 404,
                message: "not found".into(),
                rate: RateLimit::default(),
            })
        }

        fn is_org_member(&self, org: &str, login: &str) -> ProviderResult<ApiResponse<bool>> {
            self.0.is_org_member(org, login)
        }
    }

    #[test]
    fn test_concurrency_never_exceeds_limit() {
        let names: Vec<String> = (0..24).map(|i| format!("u{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let provider = FakeProvider {
            delay: Duration::from_millis(5),
            ..Default::default()
        };
        let got = enricher(3)
            .enrich(&provider, authors(&refs), Cohort::new(24, 24), "o", false)
            .unwrap();
        assert_eq!(got.len(), 24);
        let peak = provider.max_in_flight.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak concurrency {peak}");
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let provider = FakeProvider {
            panic_user: Some("bad".into()),
            ..Default::default()
        };
        let err = enricher(1)
            .enrich(&provider, authors(&["bad"]), Cohort::new(1, 1), "o", true)
            .unwrap_err();
        assert!(matches!(err, ReputerError::WorkerPanicked));
    }

    #[test]
    fn test_backoff_applied_per_call() {
        let slept = Arc::new(Mutex::new(0usize));
        let recorder = Arc::clone(&slept);
        let backoff = Backoff::new(10, Duration::ZERO).with_sleeper(move |_| {
            *recorder.lock().unwrap() += 1;
        });
        let provider = FakeProvider {
            rate: RateLimit::new(2, Utc::now() + chrono::Duration::minutes(1)),
            ..Default::default()
        };
        Enricher::new(2, backoff)
            .with_now(now())
            .enrich(&provider, authors(&["a", "b"]), Cohort::new(2, 2), "o", false)
            .unwrap();
        // profile + membership reply for each author
        assert_eq!(*slept.lock().unwrap(), 4);
    }

    #[test]
    fn test_rate_limited_membership_failure_still_backs_off() {
        let slept = Arc::new(Mutex::new(0usize));
        let recorder = Arc::clone(&slept);
        let backoff = Backoff::new(10, Duration::ZERO).with_sleeper(move |_| {
            *recorder.lock().unwrap() += 1;
        });
        let provider = FakeProvider {
            membership_quota_exhausted: Some(RateLimit::new(
                0,
                Utc::now() + chrono::Duration::minutes(1),
            )),
            ..Default::default()
        };
        let got = Enricher::new(1, backoff)
            .with_now(now())
            .enrich(&provider, authors(&["a"]), Cohort::new(1, 1), "o", true)
            .unwrap();
        assert!(!got[0].stats.as_ref().unwrap().org_member);
        assert_eq!(*slept.lock().unwrap(), 1);
    }
}
