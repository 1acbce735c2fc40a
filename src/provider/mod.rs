//! Hosting provider integration
//!
//! A provider exposes three operations over a hosting service's REST API:
//! list a page of commits, fetch a user profile, and check organization
//! membership. Each reply carries the provider's rate-limit quota so callers
//! can back off before exhausting it.
//!
//! Providers are looked up by repository host through an immutable
//! [`ProviderRegistry`] built once at startup.
//!
//! # Example
//!
//! ```no_run
//! use reputer::config::UserConfig;
//! use reputer::provider::ProviderRegistry;
//!
//! let config = UserConfig::load().unwrap();
//! let registry = ProviderRegistry::from_config(&config);
//! let github = registry.get("github.com").unwrap();
//! let user = github.get_user("octocat").unwrap();
//! println!("{} followers", user.data.followers);
//! ```

pub mod github;
pub mod gitlab;
mod http;
mod rate_limit;

pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use rate_limit::{Backoff, RateLimit, DEFAULT_MARGIN, DEFAULT_MIN_REMAINING};

use crate::config::UserConfig;
use crate::query::Query;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by provider calls
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{env_var} environment variable must be set (or configure a token in {config_hint})")]
    MissingToken {
        env_var: &'static str,
        config_hint: String,
    },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("API error from {url}: {status} - {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
        /// Quota headers sent with the error reply
        rate: RateLimit,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ProviderError {
    /// Quota reported alongside a failed call, when the server sent one
    pub fn rate(&self) -> Option<RateLimit> {
        match self {
            ProviderError::Api { rate, .. } => Some(*rate),
            _ => None,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A provider reply plus the quota information that came with it
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub rate: RateLimit,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, rate: RateLimit) -> Self {
        Self { data, rate }
    }

    /// A reply without quota information (back-off is skipped)
    pub fn unmetered(data: T) -> Self {
        Self::new(data, RateLimit::default())
    }
}

/// One commit as seen in a provider's commit listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub sha: String,
    /// Identity of the author at the provider; `None` for orphaned commits
    pub author_login: Option<String>,
    /// Provider verification verdict; `None` means unknown (treated as unverified)
    pub verified: Option<bool>,
    pub committed_at: Option<DateTime<Utc>>,
}

/// Profile-level signals for one account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub login: String,
    pub suspended_at: Option<DateTime<Utc>>,
    pub strong_auth: bool,
    pub followers: i64,
    pub following: i64,
    pub public_repos: i64,
    pub private_repos: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

/// Repository hosting backend.
///
/// Implementations handle authentication, serialization and transport;
/// they never sleep for rate limits themselves.
pub trait Provider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Verify the provider can be used (credentials present, etc.)
    fn check(&self) -> ProviderResult<()> {
        Ok(())
    }

    /// List one page of commits, newest first, starting at the query's commit
    fn list_commits(
        &self,
        query: &Query,
        page: u32,
        per_page: u32,
    ) -> ProviderResult<ApiResponse<Vec<CommitSummary>>>;

    /// Fetch the profile of `login`
    fn get_user(&self, login: &str) -> ProviderResult<ApiResponse<UserProfile>>;

    /// Check whether `login` is a member of organization `org`
    fn is_org_member(&self, org: &str, login: &str) -> ProviderResult<ApiResponse<bool>>;
}

/// Immutable table from repository host (e.g. `github.com`) to provider.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for repositories hosted on `kind`
    pub fn with(mut self, kind: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.providers.insert(kind.into(), provider);
        self
    }

    /// Registry with the built-in GitHub and GitLab providers
    pub fn from_config(config: &UserConfig) -> Self {
        Self::new()
            .with(github::KIND, Arc::new(GitHubProvider::from_config(config)))
            .with(gitlab::KIND, Arc::new(GitLabProvider::from_config(config)))
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(kind)
    }

    /// Registered hosts, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
