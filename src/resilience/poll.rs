//! Poll-until combinators.
//!
//! # Semantics
//! - The condition is checked immediately, then after each interval
//! - A check error aborts the poll (no internal retry)
//! - Sleeps are clamped to the deadline; the condition is checked once more at the
//!   deadline before `PollTimeout` is returned

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::config::schema::PollingConfig;
use crate::error::{Error, Result};
use crate::resilience::backoff::calculate_backoff;

/// Timeout and interval for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
    /// Upper bound for the backed-off interval. Equal to `interval` for
    /// fixed-interval polling.
    pub max_interval: Duration,
}

impl PollPolicy {
    /// Fixed-interval polling.
    pub fn fixed(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            max_interval: interval,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.max_interval <= self.interval
    }

    /// Sleep before the check following `attempt`. Fixed policies never jitter.
    fn delay(&self, attempt: u32) -> Duration {
        if self.is_fixed() {
            return self.interval;
        }
        calculate_backoff(
            attempt,
            self.interval.as_millis() as u64,
            self.max_interval.as_millis() as u64,
        )
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            interval: Duration::from_millis(config.interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms.max(config.interval_ms)),
        }
    }
}

/// Evaluate `check` until `accept` holds for its value.
pub async fn retry_until<T, F, Fut, A>(
    policy: &PollPolicy,
    what: &str,
    mut check: F,
    accept: A,
) -> Result<T>
where
    T: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    A: Fn(&T) -> bool,
{
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let value = check().await?;
        if accept(&value) {
            tracing::debug!(
                what,
                attempts = attempt,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Condition met"
            );
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(what, attempts = attempt, last = ?value, "Condition not met before timeout");
            return Err(Error::PollTimeout {
                what: what.to_string(),
                timeout_ms: policy.timeout.as_millis() as u64,
                last: Some(format!("{:?}", value)),
            });
        }

        let delay = policy.delay(attempt).min(deadline - now);
        tracing::trace!(what, attempt, delay_ms = delay.as_millis() as u64, "Condition pending");
        sleep(delay).await;
    }
}

/// Poll until `check` returns `true`.
pub async fn check_until<F, Fut>(policy: &PollPolicy, what: &str, check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    retry_until(policy, what, check, |ok| *ok).await.map(|_| ())
}

/// Poll until `check` returns a value equal to `expected`.
pub async fn check_until_eq<T, F, Fut>(
    policy: &PollPolicy,
    what: &str,
    check: F,
    expected: T,
) -> Result<()>
where
    T: PartialEq + Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_until(policy, what, check, |v| *v == expected)
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(timeout_ms: u64, interval_ms: u64) -> PollPolicy {
        PollPolicy::fixed(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(interval_ms),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_within_one_interval() {
        let start = Instant::now();
        let becomes_true = Duration::from_millis(1_250);
        let interval = Duration::from_millis(200);

        check_until(&policy(10_000, 200), "flag", || async move {
            Ok(start.elapsed() >= becomes_true)
        })
        .await
        .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= becomes_true);
        assert!(elapsed <= becomes_true + interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_policy_polls_on_exact_ticks() {
        let start = Instant::now();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let s = seen.clone();
        let _ = check_until(&policy(1_000, 250), "never", move || {
            let s = s.clone();
            async move {
                s.lock().unwrap().push(start.elapsed());
                Ok(false)
            }
        })
        .await;

        let ticks: Vec<u64> = seen.lock().unwrap().iter().map(|d| d.as_millis() as u64).collect();
        assert_eq!(ticks, vec![0, 250, 500, 750, 1_000]);
    }

    #[test]
    fn test_fixed_delay_has_no_jitter() {
        let policy = policy(60_000, 1_000);
        assert!(policy.is_fixed());
        for attempt in 1..50 {
            assert_eq!(policy.delay(attempt), Duration::from_millis(1_000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_deadline() {
        let start = Instant::now();
        let err = check_until(&policy(1_000, 300), "never", || async { Ok(false) })
            .await
            .unwrap_err();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1_000));
        assert!(elapsed < Duration::from_millis(1_010));
        match err {
            Error::PollTimeout { what, timeout_ms, last } => {
                assert_eq!(what, "never");
                assert_eq!(timeout_ms, 1_000);
                assert_eq!(last.as_deref(), Some("false"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_equality_form() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        check_until_eq(
            &policy(5_000, 100),
            "count",
            move || {
                let c = c.clone();
                async move { Ok(c.fetch_add(1, Ordering::SeqCst)) }
            },
            3u32,
        )
        .await
        .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_aborts_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let err = check_until(&policy(5_000, 100), "failing", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(Error::Consistency("boom".into()))
            }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_bounded() {
        let start = Instant::now();
        let polls = Arc::new(AtomicU32::new(0));
        let p = polls.clone();
        let policy = PollPolicy {
            timeout: Duration::from_millis(3_000),
            interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(400),
        };
        let _ = check_until(&policy, "never", move || {
            let p = p.clone();
            async move {
                p.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            }
        })
        .await;
        assert!(start.elapsed() >= Duration::from_millis(3_000));
        assert!(start.elapsed() < Duration::from_millis(3_010));
        // 100 + 200 + 400 + 400 ... fewer polls than fixed 100ms would make
        let n = polls.load(Ordering::SeqCst);
        assert!(n > 5 && n < 30, "polls: {n}");
    }

    #[test]
    fn test_policy_from_config() {
        let config = PollingConfig {
            timeout_ms: 24_000,
            interval_ms: 500,
            max_interval_ms: 100,
        };
        let policy = PollPolicy::from(&config);
        assert_eq!(policy.timeout, Duration::from_secs(24));
        // max never below the base interval
        assert_eq!(policy.max_interval, Duration::from_millis(500));
    }
}
