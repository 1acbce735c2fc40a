//! GitHub REST v3 provider

use super::http::{ApiClient, QuotaHeaders};
use super::{ApiResponse, CommitSummary, Provider, ProviderError, ProviderResult, UserProfile};
use crate::config::UserConfig;
use crate::query::Query;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Repository host served by this provider
pub const KIND: &str = "github.com";

pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const QUOTA: QuotaHeaders = QuotaHeaders {
    remaining: "x-ratelimit-remaining",
    reset: "x-ratelimit-reset",
};

pub struct GitHubProvider {
    client: ApiClient,
    has_token: bool,
}

impl GitHubProvider {
    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let has_token = token.is_some();
        let auth = token.map(|t| format!("Bearer {}", t));
        Self {
            client: ApiClient::new(api_url, timeout, "Authorization", auth, QUOTA),
            has_token,
        }
    }

    pub fn from_config(config: &UserConfig) -> Self {
        Self::new(
            config.github_api_url(),
            config.github_token().map(str::to_string),
            config.http_timeout(),
        )
    }

    pub fn api_url(&self) -> &str {
        self.client.base_url()
    }
}

impl Provider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn check(&self) -> ProviderResult<()> {
        if self.has_token {
            Ok(())
        } else {
            Err(ProviderError::MissingToken {
                env_var: TOKEN_ENV,
                config_hint: "[github] token".to_string(),
            })
        }
    }

    fn list_commits(
        &self,
        query: &Query,
        page: u32,
        per_page: u32,
    ) -> ProviderResult<ApiResponse<Vec<CommitSummary>>> {
        let path = format!("/repos/{}/{}/commits", query.owner, query.name);
        let mut params = vec![("page", page.to_string()), ("per_page", per_page.to_string())];
        if let Some(sha) = query.commit() {
            params.push(("sha", sha.to_string()));
        }

        let (payload, rate) = self.client.get_json::<Vec<CommitPayload>>(&path, &params)?;
        let commits = payload.into_iter().map(CommitSummary::from).collect();
        Ok(ApiResponse::new(commits, rate))
    }

    fn get_user(&self, login: &str) -> ProviderResult<ApiResponse<UserProfile>> {
        let path = format!("/users/{}", login);
        let (payload, rate) = self.client.get_json::<UserPayload>(&path, &[])?;
        Ok(ApiResponse::new(payload.into(), rate))
    }

    fn is_org_member(&self, org: &str, login: &str) -> ProviderResult<ApiResponse<bool>> {
        let path = format!("/orgs/{}/members/{}", org, login);
        let reply = self.client.get(&path, &[])?;
        let rate = reply.rate;
        match reply.status {
            204 => Ok(ApiResponse::new(true, rate)),
            404 => Ok(ApiResponse::new(false, rate)),
            _ => Err(reply.into_error()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    sha: String,
    commit: CommitDetail,
    /// GitHub account linked to the commit; null when the email is unknown
    author: Option<AccountRef>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Option<Signature>,
    verification: Option<Verification>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Verification {
    verified: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct AccountRef {
    login: String,
}

impl From<CommitPayload> for CommitSummary {
    fn from(c: CommitPayload) -> Self {
        Self {
            sha: c.sha,
            author_login: c.author.map(|a| a.login).filter(|l| !l.is_empty()),
            verified: c.commit.verification.and_then(|v| v.verified),
            committed_at: c.commit.committer.and_then(|s| s.date),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
    #[serde(default)]
    suspended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    two_factor_authentication: Option<bool>,
    #[serde(default)]
    followers: i64,
    #[serde(default)]
    following: i64,
    #[serde(default)]
    public_repos: i64,
    /// Only visible to the account itself or with admin scope
    #[serde(default)]
    total_private_repos: Option<i64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    company: Option<String>,
}

impl From<UserPayload> for UserProfile {
    fn from(u: UserPayload) -> Self {
        Self {
            login: u.login,
            suspended_at: u.suspended_at,
            strong_auth: u.two_factor_authentication.unwrap_or(false),
            followers: u.followers,
            following: u.following,
            public_repos: u.public_repos,
            private_repos: u.total_private_repos.unwrap_or(0),
            created_at: u.created_at,
            name: u.name,
            email: u.email,
            company: u.company,
        }
    }
}
