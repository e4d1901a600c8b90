//! Rate limiting support
//!
//! GitHub answers an exhausted quota with 403/429. Requests are retried after
//! sleeping until the reported reset instant, within a bounded budget.

use crate::github::error::GitHubError;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use log::{info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Slack added on top of the reported reset instant.
const RESET_GRACE: Duration = Duration::from_secs(1);

/// Wait used when GitHub does not tell us when the window resets.
const UNKNOWN_RESET_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Retries after the first rate-limited attempt.
    pub max_retries: u32,
    /// Longest single wait we accept; anything longer fails immediately.
    pub max_wait: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_wait: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitPolicy {
    /// How long to sleep before retrying, or `None` if the wait exceeds the cap.
    #[must_use]
    pub fn wait_for(&self, reset_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Duration> {
        let wait = match reset_at {
            Some(reset) => (reset - now).to_std().unwrap_or(Duration::ZERO) + RESET_GRACE,
            None => UNKNOWN_RESET_WAIT,
        };
        (wait <= self.max_wait).then_some(wait)
    }
}

fn seconds_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    now.checked_add_signed(TimeDelta::try_seconds(secs.max(0))?)
}

/// Reset instant announced by the headers of a rate-limited response.
///
/// `retry-after` (seconds) wins. An exhausted primary quota
/// (`x-ratelimit-remaining: 0`) resets at `x-ratelimit-reset` (epoch
/// seconds). A secondary limit that names neither waits a minute. `None`
/// when the response carried no usable rate limit header.
#[must_use]
pub fn reset_from_headers(
    retry_after: Option<&str>,
    remaining: Option<&str>,
    reset: Option<&str>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if let Some(secs) = retry_after.and_then(|v| v.trim().parse::<i64>().ok()) {
        return seconds_after(now, secs);
    }
    match remaining.and_then(|v| v.trim().parse::<u64>().ok())? {
        0 => {
            let epoch = reset?.trim().parse::<i64>().ok()?;
            Utc.timestamp_opt(epoch, 0).single()
        }
        _ => seconds_after(now, UNKNOWN_RESET_WAIT.as_secs() as i64),
    }
}

/// Run `op`, retrying rate-limited attempts per `policy`.
///
/// `reset_lookup` is consulted only when the failed attempt carried no reset
/// instant from its headers (the adapter queries `/rate_limit` there). Non rate-limit results
/// are returned untouched.
pub async fn retry_rate_limited<T, Op, OpFut, Lookup, LookupFut>(
    policy: &RateLimitPolicy,
    mut op: Op,
    mut reset_lookup: Lookup,
) -> Result<T, GitHubError>
where
    Op: FnMut() -> OpFut,
    OpFut: Future<Output = Result<T, GitHubError>>,
    Lookup: FnMut() -> LookupFut,
    LookupFut: Future<Output = Option<DateTime<Utc>>>,
{
    let mut retries = 0u32;
    loop {
        let reset_at = match op().await {
            Err(GitHubError::RateLimit { reset_at, .. }) => reset_at,
            other => return other,
        };
        let reset_at = match reset_at {
            Some(at) => Some(at),
            None => reset_lookup().await,
        };

        if retries >= policy.max_retries {
            warn!("Rate limit retry budget exhausted after {retries} retries");
            return Err(GitHubError::RateLimit { reset_at, retries });
        }

        let Some(wait) = policy.wait_for(reset_at, Utc::now()) else {
            warn!(
                "Rate limit resets too far in the future (cap {:?}), giving up",
                policy.max_wait
            );
            return Err(GitHubError::RateLimit { reset_at, retries });
        };

        retries += 1;
        info!(
            "Rate limited, waiting {wait:?} before retry {retries}/{}",
            policy.max_retries
        );
        sleep(wait).await;
    }
}
