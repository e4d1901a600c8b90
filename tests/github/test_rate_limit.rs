//! Tests for the rate limit retry policy.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use repo_insights::GitHubError;
use repo_insights::github::{RateLimitPolicy, reset_from_headers, retry_rate_limited};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn limited() -> GitHubError {
    GitHubError::RateLimit {
        reset_at: None,
        retries: 0,
    }
}

#[test]
fn test_wait_for_reset_in_future() {
    let policy = RateLimitPolicy::default();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let reset = now + ChronoDuration::seconds(30);
    assert_eq!(policy.wait_for(Some(reset), now), Some(Duration::from_secs(31)));
}

#[test]
fn test_wait_for_reset_in_past() {
    let policy = RateLimitPolicy::default();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let reset = now - ChronoDuration::seconds(30);
    assert_eq!(policy.wait_for(Some(reset), now), Some(Duration::from_secs(1)));
}

#[test]
fn test_wait_for_unknown_reset() {
    let policy = RateLimitPolicy::default();
    assert_eq!(policy.wait_for(None, Utc::now()), Some(Duration::from_secs(60)));
}

#[test]
fn test_wait_for_beyond_cap() {
    let policy = RateLimitPolicy::default();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let reset = now + ChronoDuration::hours(1);
    assert_eq!(policy.wait_for(Some(reset), now), None);
}

#[test]
fn test_retry_after_header_wins() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let reset = now + ChronoDuration::minutes(50);
    let epoch = reset.timestamp().to_string();

    assert_eq!(
        reset_from_headers(Some("30"), Some("0"), Some(epoch.as_str()), now),
        Some(now + ChronoDuration::seconds(30))
    );
}

#[test]
fn test_exhausted_quota_uses_reset_header() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let reset = now + ChronoDuration::seconds(90);
    let epoch = reset.timestamp().to_string();

    assert_eq!(reset_from_headers(None, Some("0"), Some(epoch.as_str()), now), Some(reset));
    assert_eq!(reset_from_headers(Some("soon"), Some("0"), Some(epoch.as_str()), now), Some(reset));
}

#[test]
fn test_secondary_limit_without_retry_after_waits_a_minute() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let far = (now + ChronoDuration::minutes(50)).timestamp().to_string();

    assert_eq!(
        reset_from_headers(None, Some("4999"), Some(far.as_str()), now),
        Some(now + ChronoDuration::seconds(60))
    );
}

#[test]
fn test_no_rate_limit_headers() {
    let now = Utc::now();
    assert_eq!(reset_from_headers(None, None, None, now), None);
    assert_eq!(reset_from_headers(None, Some("0"), None, now), None);
}

#[tokio::test(start_paused = true)]
async fn test_header_reset_skips_quota_lookup() {
    let policy = RateLimitPolicy::default();
    let calls = AtomicU32::new(0);
    let lookups = AtomicU32::new(0);

    let result = retry_rate_limited(
        &policy,
        || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    // 429 with `retry-after: 30` while the core quota is fine.
                    Err(GitHubError::RateLimit {
                        reset_at: reset_from_headers(Some("30"), Some("4999"), None, Utc::now()),
                        retries: 0,
                    })
                } else {
                    Ok(n)
                }
            }
        },
        || {
            lookups.fetch_add(1, Ordering::SeqCst);
            async { Some(Utc::now() + ChronoDuration::minutes(50)) }
        },
    )
    .await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhausted() {
    let policy = RateLimitPolicy::default();
    let calls = AtomicU32::new(0);

    let result: Result<(), GitHubError> = retry_rate_limited(
        &policy,
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(limited()) }
        },
        || async { None },
    )
    .await;

    assert!(matches!(result, Err(GitHubError::RateLimit { retries: 3, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers() {
    let policy = RateLimitPolicy::default();
    let calls = AtomicU32::new(0);

    let result = retry_rate_limited(
        &policy,
        || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err(limited()) } else { Ok(n) } }
        },
        || async { None },
    )
    .await;

    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reset_beyond_cap_fails_immediately() {
    let policy = RateLimitPolicy {
        max_retries: 3,
        max_wait: Duration::from_secs(60),
    };
    let calls = AtomicU32::new(0);
    let far = Utc::now() + ChronoDuration::hours(2);

    let result: Result<(), GitHubError> = retry_rate_limited(
        &policy,
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(GitHubError::RateLimit {
                    reset_at: Some(far),
                    retries: 0,
                })
            }
        },
        || async { None },
    )
    .await;

    assert!(matches!(result, Err(GitHubError::RateLimit { retries: 0, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_other_errors_pass_through() {
    let policy = RateLimitPolicy::default();
    let calls = AtomicU32::new(0);

    let result: Result<(), GitHubError> = retry_rate_limited(
        &policy,
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GitHubError::Api("boom".into())) }
        },
        || async { None },
    )
    .await;

    assert!(matches!(result, Err(GitHubError::Api(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
