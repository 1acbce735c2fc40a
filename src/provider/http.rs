//! Shared blocking HTTP plumbing for provider clients (sync ureq, no runtime)

use super::{ProviderError, ProviderResult, RateLimit};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("reputer/", env!("CARGO_PKG_VERSION"));

/// Header names carrying quota information for one provider
#[derive(Debug, Clone, Copy)]
pub(crate) struct QuotaHeaders {
    pub remaining: &'static str,
    pub reset: &'static str,
}

pub(crate) fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

/// Authenticated GET against a provider API
pub(crate) struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    auth_header: &'static str,
    auth_value: Option<String>,
    quota: QuotaHeaders,
}

/// Raw reply: status, quota, and the response for further reading
pub(crate) struct Reply {
    pub status: u16,
    pub rate: RateLimit,
    pub url: String,
    response: ureq::http::Response<ureq::Body>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        auth_header: &'static str,
        auth_value: Option<String>,
        quota: QuotaHeaders,
    ) -> Self {
        Self {
            agent: make_agent(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
            auth_value,
            quota,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET for `path` with query parameters. Any status is returned.
    pub fn get(&self, path: &str, params: &[(&str, String)]) -> ProviderResult<Reply> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT);
        if let Some(value) = &self.auth_value {
            req = req.header(self.auth_header, value);
        }
        for (key, value) in params {
            req = req.query(*key, value);
        }

        let response = req.call().map_err(|e| ProviderError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let rate = RateLimit::from_headers(
            header(self.quota.remaining).as_deref(),
            header(self.quota.reset).as_deref(),
        );

        Ok(Reply {
            status: response.status().as_u16(),
            rate,
            url,
            response,
        })
    }

    /// GET and decode a JSON body, failing on any non-2xx status
    pub fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ProviderResult<(T, RateLimit)> {
        let reply = self.get(path, params)?;
        let rate = reply.rate;
        Ok((reply.json()?, rate))
    }
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-2xx reply into an API error carrying the body text
    pub fn into_error(self) -> ProviderError {
        let message = self
            .response
            .into_body()
            .read_to_string()
            .unwrap_or_default();
        ProviderError::Api {
            url: self.url,
            status: self.status,
            message: message.trim().to_string(),
            rate: self.rate,
        }
    }

    pub fn json<T: DeserializeOwned>(self) -> ProviderResult<T> {
        if !self.is_success() {
            return Err(self.into_error());
        }
        let url = self.url;
        self.response
            .into_body()
            .read_json()
            .map_err(|e| ProviderError::Decode {
                url,
                message: e.to_string(),
            })
    }
}
