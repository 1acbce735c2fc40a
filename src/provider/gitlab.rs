//! GitLab REST v4 provider
//!
//! GitLab commit listings carry no account login, so authors are keyed by
//! the commit author email. Profiles are resolved through a user search on
//! that email; most GitLab users hide their email, in which case the author
//! gets an empty profile instead of failing the report.

use super::http::{ApiClient, QuotaHeaders};
use super::{ApiResponse, CommitSummary, Provider, ProviderError, ProviderResult, UserProfile};
use crate::config::UserConfig;
use crate::query::Query;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

pub const KIND: &str = "gitlab.com";

pub const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4";

pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

const QUOTA: QuotaHeaders = QuotaHeaders {
    remaining: "ratelimit-remaining",
    reset: "ratelimit-reset",
};

pub struct GitLabProvider {
    client: ApiClient,
    has_token: bool,
}

impl GitLabProvider {
    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let has_token = token.is_some();
        Self {
            client: ApiClient::new(api_url, timeout, "PRIVATE-TOKEN", token, QUOTA),
            has_token,
        }
    }

    pub fn from_config(config: &UserConfig) -> Self {
        Self::new(
            config.gitlab_api_url(),
            config.gitlab_token().map(str::to_string),
            config.http_timeout(),
        )
    }
}

/// Encode a namespaced path (`group/project`) as a single URL segment
fn encode_path(path: &str) -> String {
    path.replace('/', "%2F")
}

impl Provider for GitLabProvider {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn check(&self) -> ProviderResult<()> {
        if self.has_token {
            Ok(())
        } else {
            Err(ProviderError::MissingToken {
                env_var: TOKEN_ENV,
                config_hint: "[gitlab] token".to_string(),
            })
        }
    }

    fn list_commits(
        &self,
        query: &Query,
        page: u32,
        per_page: u32,
    ) -> ProviderResult<ApiResponse<Vec<CommitSummary>>> {
        let path = format!("/projects/{}/repository/commits", encode_path(&query.slug()));
        let mut params = vec![("page", page.to_string()), ("per_page", per_page.to_string())];
        if let Some(sha) = query.commit() {
            params.push(("ref_name", sha.to_string()));
        }

        let (payload, rate) = self.client.get_json::<Vec<CommitPayload>>(&path, &params)?;
        let commits = payload.into_iter().map(CommitSummary::from).collect();
        Ok(ApiResponse::new(commits, rate))
    }

    fn get_user(&self, login: &str) -> ProviderResult<ApiResponse<UserProfile>> {
        let (matches, rate) = self
            .client
            .get_json::<Vec<UserRef>>("/users", &[("search", login.to_string())])?;

        // Search also matches usernames and names; only an exact email counts
        let Some(found) = matches.into_iter().find(|u| u.has_email(login)) else {
            return Ok(ApiResponse::new(
                UserProfile {
                    login: login.to_string(),
                    ..Default::default()
                },
                rate,
            ));
        };

        let (payload, rate) = self
            .client
            .get_json::<UserPayload>(&format!("/users/{}", found.id), &[])?;
        let mut profile = payload.into_profile(Utc::now());
        profile.login = login.to_string();
        Ok(ApiResponse::new(profile, rate))
    }

    fn is_org_member(&self, org: &str, login: &str) -> ProviderResult<ApiResponse<bool>> {
        let path = format!("/groups/{}/members/all", encode_path(org));
        let reply = self.client.get(&path, &[("query", login.to_string())])?;
        let rate = reply.rate;
        if reply.status == 404 {
            // Owner is a user namespace, not a group
            return Ok(ApiResponse::new(false, rate));
        }
        let members: Vec<MemberPayload> = reply.json()?;
        let member = members.iter().any(|m| m.matches(login));
        Ok(ApiResponse::new(member, rate))
    }
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    id: String,
    #[serde(default)]
    author_email: Option<String>,
    #[serde(default)]
    committed_date: Option<DateTime<Utc>>,
}

impl From<CommitPayload> for CommitSummary {
    fn from(c: CommitPayload) -> Self {
        Self {
            sha: c.id,
            author_login: c
                .author_email
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
            verified: None,
            committed_at: c.committed_date,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: u64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    public_email: Option<String>,
}

impl UserRef {
    fn has_email(&self, email: &str) -> bool {
        [&self.email, &self.public_email]
            .into_iter()
            .flatten()
            .any(|e| e.trim().eq_ignore_ascii_case(email))
    }
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    public_email: Option<String>,
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    followers: i64,
    #[serde(default)]
    following: i64,
    /// Admin-only field
    #[serde(default)]
    two_factor_enabled: Option<bool>,
}

impl UserPayload {
    /// GitLab reports a state rather than a suspension time, so a blocked
    /// account is stamped with the time it was observed.
    fn into_profile(self, observed_at: DateTime<Utc>) -> UserProfile {
        let suspended = matches!(self.state.as_deref(), Some("blocked") | Some("banned"));
        UserProfile {
            login: String::new(),
            suspended_at: suspended.then_some(observed_at),
            strong_auth: self.two_factor_enabled.unwrap_or(false),
            followers: self.followers,
            following: self.following,
            public_repos: 0,
            private_repos: 0,
            created_at: self.created_at,
            name: self.name.filter(|n| !n.is_empty()),
            email: self.public_email.filter(|e| !e.is_empty()),
            company: self.organization.filter(|o| !o.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MemberPayload {
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    public_email: Option<String>,
}

impl MemberPayload {
    fn matches(&self, login: &str) -> bool {
        self.username.eq_ignore_ascii_case(login)
            || [&self.email, &self.public_email]
                .into_iter()
                .flatten()
                .any(|e| e.eq_ignore_ascii_case(login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("group/sub/project"), "group%2Fsub%2Fproject");
        assert_eq!(encode_path("plain"), "plain");
    }

    #[test]
    fn test_decode_commits_keyed_by_email() {
        let payload: Vec<CommitPayload> = serde_json::from_str(
            r#"[
                {"id": "c1", "author_name": "Ada", "author_email": "Ada@Example.com",
                 "committed_date": "2024-03-01T10:00:00Z"},
                {"id": "c2", "author_email": ""}
            ]"#,
        )
        .unwrap();
        let commits: Vec<CommitSummary> = payload.into_iter().map(Into::into).collect();
        assert_eq!(commits[0].author_login.as_deref(), Some("ada@example.com"));
        assert_eq!(commits[0].verified, None);
        assert!(commits[0].committed_at.is_some());
        assert_eq!(commits[1].author_login, None);
    }

    #[test]
    fn test_user_search_requires_exact_email() {
        let found: Vec<UserRef> = serde_json::from_str(
            r#"[
                {"id": 1, "username": "ada-lovelace", "public_email": "ada.l@example.org"},
                {"id": 2, "username": "ada", "public_email": "Ada@Example.com"},
                {"id": 3, "username": "ada2"}
            ]"#,
        )
        .unwrap();
        let hit = found.iter().find(|u| u.has_email("ada@example.com"));
        assert_eq!(hit.map(|u| u.id), Some(2));
        assert!(!found.iter().any(|u| u.has_email("ada")));
        assert!(!found[2].has_email("ada@example.com"));
    }

    #[test]
    fn test_blocked_user_is_suspended() {
        let payload: UserPayload = serde_json::from_str(
            r#"{"id": 7, "username": "u", "state": "blocked", "followers": 3,
                "created_at": "2020-01-01T00:00:00Z", "organization": ""}"#,
        )
        .unwrap();
        let now = Utc::now();
        let profile = payload.into_profile(now);
        assert_eq!(profile.suspended_at, Some(now));
        assert_eq!(profile.followers, 3);
        assert!(profile.company.is_none());
        assert!(!profile.strong_auth);
    }

    #[test]
    fn test_active_user_is_not_suspended() {
        let payload: UserPayload =
            serde_json::from_str(r#"{"state": "active", "two_factor_enabled": true}"#).unwrap();
        let profile = payload.into_profile(Utc::now());
        assert!(profile.suspended_at.is_none());
        assert!(profile.strong_auth);
    }

    #[test]
    fn test_member_matches_username_or_email() {
        let m = MemberPayload {
            username: "ada".into(),
            email: None,
            public_email: Some("ada@example.com".into()),
        };
        assert!(m.matches("ADA"));
        assert!(m.matches("ada@example.com"));
        assert!(!m.matches("bob"));
    }

    #[test]
    fn test_check_requires_token() {
        let p = GitLabProvider::new(DEFAULT_API_URL, None, Duration::from_secs(1));
        assert!(p.check().unwrap_err().to_string().contains(TOKEN_ENV));
    }
}
