//! User-level configuration for reputer
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/reputer/config.toml

use crate::provider::{github, gitlab, Backoff, DEFAULT_MARGIN, DEFAULT_MIN_REMAINING};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding `[enrichment] concurrency`
pub const CONCURRENCY_ENV: &str = "REPUTER_CONCURRENCY";

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub github: ProviderConfig,
    #[serde(default)]
    pub gitlab: ProviderConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// API token (prefer the environment variable over storing it here)
    pub token: Option<String>,

    /// API base URL, e.g. for GitHub Enterprise or self-hosted GitLab
    pub api_url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct CollectionConfig {
    /// Commits requested per page (default: 100)
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    /// Authors enriched in parallel (default: 10)
    pub concurrency: Option<usize>,

    /// Pause when fewer requests than this remain (default: 10)
    pub rate_limit_min_remaining: Option<u64>,

    /// Seconds added to the quota reset wait (default: 1)
    pub rate_limit_margin_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: Option<u64>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/reputer/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = match Self::user_config_path() {
            Some(path) => Self::load_from(&path)?,
            None => UserConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file without environment overrides.
    ///
    /// A missing file yields defaults. A malformed file is reported and
    /// ignored rather than aborting the run.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = UserConfig::default();
        if !path.exists() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        match toml::from_str::<UserConfig>(&content) {
            Ok(file_config) => config.merge(file_config),
            Err(e) => warn!("Ignoring invalid config file {}: {}", path.display(), e),
        }
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reputer").join("config.toml"))
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(github::TOKEN_ENV) {
            self.github.token = Some(token);
        }
        if let Some(token) = non_empty(gitlab::TOKEN_ENV) {
            self.gitlab.token = Some(token);
        }
        if let Some(raw) = non_empty(CONCURRENCY_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.enrichment.concurrency = Some(n),
                _ => warn!("Ignoring invalid {}={}", CONCURRENCY_ENV, raw),
            }
        }
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        self.github.merge(other.github);
        self.gitlab.merge(other.gitlab);
        if other.collection.page_size.is_some() {
            self.collection.page_size = other.collection.page_size;
        }
        if other.enrichment.concurrency.is_some() {
            self.enrichment.concurrency = other.enrichment.concurrency;
        }
        if other.enrichment.rate_limit_min_remaining.is_some() {
            self.enrichment.rate_limit_min_remaining = other.enrichment.rate_limit_min_remaining;
        }
        if other.enrichment.rate_limit_margin_secs.is_some() {
            self.enrichment.rate_limit_margin_secs = other.enrichment.rate_limit_margin_secs;
        }
        if other.http.timeout_secs.is_some() {
            self.http.timeout_secs = other.http.timeout_secs;
        }
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref()
    }

    pub fn github_api_url(&self) -> &str {
        self.github
            .api_url
            .as_deref()
            .unwrap_or(github::DEFAULT_API_URL)
    }

    pub fn gitlab_token(&self) -> Option<&str> {
        self.gitlab.token.as_deref()
    }

    pub fn gitlab_api_url(&self) -> &str {
        self.gitlab
            .api_url
            .as_deref()
            .unwrap_or(gitlab::DEFAULT_API_URL)
    }

    pub fn page_size(&self) -> u32 {
        self.collection
            .page_size
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn concurrency(&self) -> usize {
        self.enrichment
            .concurrency
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Rate-limit back-off built from the `[enrichment]` settings
    pub fn backoff(&self) -> Backoff {
        let min_remaining = self
            .enrichment
            .rate_limit_min_remaining
            .unwrap_or(DEFAULT_MIN_REMAINING);
        let margin = self
            .enrichment
            .rate_limit_margin_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_MARGIN);
        Backoff::new(min_remaining, margin)
    }

    /// Write the example config to `path` unless a file already exists.
    /// Returns whether a file was written.
    pub fn init_at(path: &Path) -> Result<bool> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }
}

impl ProviderConfig {
    fn merge(&mut self, other: ProviderConfig) {
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
    }
}

const EXAMPLE_CONFIG: &str = r#"# Reputer User Configuration

[github]
# Prefer the GITHUB_TOKEN environment variable
# token = "ghp_..."
# api_url = "https://api.github.com"   # GitHub Enterprise: https://host/api/v3

[gitlab]
# Prefer the GITLAB_TOKEN environment variable
# token = "glpat-..."
# api_url = "https://gitlab.com/api/v4"

[collection]
# page_size = 100

[enrichment]
# concurrency = 10                 # or REPUTER_CONCURRENCY
# rate_limit_min_remaining = 10
# rate_limit_margin_secs = 1

[http]
# timeout_secs = 30
"#;
