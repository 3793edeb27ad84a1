//! Polling waits for asynchronously rendered page state.
//!
//! The flight calendar renders after a network fetch, so the harness has two
//! kinds of waits: fixed settle delays after an interaction (see
//! `PageProbe::wait`) and bounded polls for a condition, implemented here.
//! A poll checks the condition, sleeps `poll_interval`, and gives up with
//! `ProbeError::WaitTimeout` once `timeout` has elapsed.

use crate::error::{ProbeError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

/// Bound used when a caller has no configured timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval used when a caller has no configured one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounds for one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Give up once this much time has passed since the first check
    pub timeout: Duration,
    /// Sleep between checks
    pub poll_interval: Duration,
}

impl WaitConfig {
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Polls `check` until it yields `Ok(true)`.
///
/// The check runs at least once, even with a zero timeout. An `Err` from the
/// check counts as "not yet": a page mid-render can make an introspection
/// script fail transiently.
///
/// # Errors
///
/// `WaitTimeout` naming `condition` when the deadline passes first.
pub async fn wait_for_result<F, Fut>(check: F, config: WaitConfig, condition: &str) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + config.timeout;
    let mut attempts = 0_u32;

    loop {
        attempts += 1;
        match check().await {
            Ok(true) => {
                trace!(condition, attempts, "wait satisfied");
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => debug!(condition, attempts, error = %e, "wait check failed"),
        }

        if Instant::now() >= deadline {
            return Err(ProbeError::WaitTimeout {
                condition: condition.to_string(),
                timeout: config.timeout,
            });
        }
        sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(timeout_ms: u64) -> WaitConfig {
        WaitConfig::new(Duration::from_millis(timeout_ms), Duration::from_millis(1))
    }

    #[tokio::test]
    async fn satisfied_on_first_check() {
        let result = wait_for_result(
            || async { Ok::<_, ProbeError>(true) },
            WaitConfig::default(),
            "ready",
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn errors_count_as_pending() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = wait_for_result(
            move || {
                let counter = counter.clone();
                async move {
                    match counter.fetch_add(1, Ordering::SeqCst) {
                        0 => Err(ProbeError::ScriptExecutionFailed("not yet".into())),
                        1 => Ok(false),
                        _ => Ok(true),
                    }
                }
            },
            fast(5_000),
            "third attempt",
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out_with_condition_name() {
        let result =
            wait_for_result(|| async { Ok::<_, ProbeError>(false) }, fast(20), "month block")
                .await;

        match result {
            Err(ProbeError::WaitTimeout { condition, timeout }) => {
                assert_eq!(condition, "month block");
                assert_eq!(timeout, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_timeout_checks_exactly_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = wait_for_result(
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ProbeError>(false)
                }
            },
            WaitConfig::new(Duration::ZERO, Duration::from_millis(10)),
            "checked once",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
