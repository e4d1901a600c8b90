//! GitHub API utilities
//!
//! Shared request plumbing for the operation modules: every call goes through
//! [`ApiContext::get_json`], which applies the timeout, classifies failures and
//! retries rate-limited attempts.

use crate::github::error::{GitHubError, GitHubResult};
use crate::github::rate_limit::{RateLimitPolicy, reset_from_headers, retry_rate_limited};
use crate::github::wire::{WireErrorBody, WireRateLimit};
use crate::runtime::AsyncTask;
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use octocrab::Octocrab;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Spawn an async task for GitHub API operations.
#[inline]
pub fn spawn_task<T, F>(work: F) -> AsyncTask<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    AsyncTask::spawn_async(work)
}

/// Everything an operation needs to talk to GitHub. Cloning is cheap.
#[derive(Clone, Debug)]
pub(crate) struct ApiContext {
    pub inner: Arc<Octocrab>,
    pub policy: RateLimitPolicy,
    pub timeout: Duration,
    pub per_page: u8,
}

impl ApiContext {
    /// GET `route` and decode the JSON body. `context` names the resource in
    /// error messages.
    pub async fn get_json<T>(
        &self,
        route: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> GitHubResult<T>
    where
        T: DeserializeOwned,
    {
        retry_rate_limited(
            &self.policy,
            || self.get_once(route, params, context),
            || self.core_reset(),
        )
        .await
    }

    async fn get_once<T>(
        &self,
        route: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> GitHubResult<T>
    where
        T: DeserializeOwned,
    {
        let uri = with_query(route, params);
        debug!("GET {uri}");
        match tokio::time::timeout(self.timeout, self.fetch(&uri, context)).await {
            Ok(result) => result,
            Err(_) => Err(GitHubError::Timeout(format!(
                "{route} did not answer within {:?}",
                self.timeout
            ))),
        }
    }

    /// One raw request. Headers are read before the body so a rate-limited
    /// answer keeps the reset instant GitHub announced.
    async fn fetch<T>(&self, uri: &str, context: &str) -> GitHubResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .inner
            ._get(uri)
            .await
            .map_err(|e| GitHubError::from_octocrab(e, context))?;

        let status = response.status().as_u16();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let retry_after = header("retry-after");
        let remaining = header("x-ratelimit-remaining");
        let reset = header("x-ratelimit-reset");

        let body = self
            .inner
            .body_to_string(response)
            .await
            .map_err(|e| GitHubError::from_octocrab(e, context))?;

        if (200..300).contains(&status) {
            return serde_json::from_str(&body).map_err(|e| {
                GitHubError::Api(format!("{context}: unexpected response from {uri}: {e}"))
            });
        }

        let message = serde_json::from_str::<WireErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        let error = if status == 403 && remaining.as_deref() == Some("0") {
            GitHubError::RateLimit {
                reset_at: None,
                retries: 0,
            }
        } else {
            GitHubError::from_status(status, &message, context)
        };

        Err(match error {
            GitHubError::RateLimit { retries, .. } => {
                let reset_at = reset_from_headers(
                    retry_after.as_deref(),
                    remaining.as_deref(),
                    reset.as_deref(),
                    Utc::now(),
                );
                debug!("{uri} rate limited (HTTP {status}), reset at {reset_at:?}");
                GitHubError::RateLimit { reset_at, retries }
            }
            other => other,
        })
    }

    /// Reset instant of the core quota, if GitHub will tell us.
    async fn core_reset(&self) -> Option<DateTime<Utc>> {
        let request = self
            .inner
            .get::<WireRateLimit, _, ()>("/rate_limit", None);
        let limits = tokio::time::timeout(self.timeout, request).await.ok()?.ok()?;
        debug!(
            "Core rate limit: {} remaining, reset at {}",
            limits.resources.core.remaining, limits.resources.core.reset
        );
        Utc.timestamp_opt(limits.resources.core.reset, 0).single()
    }

    /// Fetch one page of a list endpoint.
    pub async fn page<T>(
        &self,
        route: &str,
        page: u32,
        extra: &[(&str, String)],
        context: &str,
    ) -> GitHubResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut params: Vec<(&str, String)> = vec![
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ];
        params.extend(extra.iter().cloned());
        self.get_json(route, &params, context).await
    }

    /// Walk every page of a list endpoint into one vector.
    pub async fn all_pages<T>(
        &self,
        route: &str,
        extra: &[(&str, String)],
        context: &str,
    ) -> GitHubResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut out = Vec::new();
        let mut page = 1;
        loop {
            let items: Vec<T> = self.page(route, page, extra, context).await?;
            let full = self.is_full_page(items.len());
            out.extend(items);
            if !full {
                return Ok(out);
            }
            page += 1;
        }
    }

    /// A page shorter than `per_page` is the last one.
    #[must_use]
    pub fn is_full_page(&self, len: usize) -> bool {
        len > 0 && len >= usize::from(self.per_page)
    }
}

/// `route?k=v&...` with percent-encoded values.
fn with_query(route: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return route.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect();
    format!("{route}?{}", query.join("&"))
}

static REPO_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:https?://)?(?:www\.)?github\.com/|git@github\.com:)?([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?(?:/.*)?$",
    )
    .ok()
});

/// Split a repository URL (or `owner/name`) into its owner and name.
///
/// Accepts `https://github.com/o/r`, a `.git` suffix, trailing path segments
/// such as `/tree/main`, `git@github.com:o/r.git` and bare `o/r`.
pub fn parse_repo_url(url: &str) -> GitHubResult<(String, String)> {
    let trimmed = url.trim().trim_end_matches('/');
    let invalid = || GitHubError::InvalidInput(format!("not a GitHub repository URL: '{url}'"));
    let re = REPO_URL.as_ref().ok_or_else(invalid)?;
    let caps = re.captures(trimmed).ok_or_else(invalid)?;
    let owner = caps.get(1).map(|m| m.as_str()).ok_or_else(invalid)?;
    let name = caps.get(2).map(|m| m.as_str()).ok_or_else(invalid)?;
    if owner.eq_ignore_ascii_case("github.com") || name.is_empty() {
        return Err(invalid());
    }
    Ok((owner.to_string(), name.to_string()))
}
