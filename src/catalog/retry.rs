use std::{
    future::Future,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Delay before retry number `attempt` (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `initial * 2^(attempt - 1)`, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. `None` retries forever.
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// One fixed-interval wait between attempts, forever.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// Fail on the first transient error.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: Some(1),
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    /// Wait for retry `attempt`, never shorter than a server-advertised delay.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = self.backoff.delay(attempt);
        retry_after.map_or(delay, |advertised| delay.max(advertised))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(6),
            backoff: Backoff::Exponential {
                initial: Duration::from_secs(1),
                max: Duration::from_secs(32),
            },
        }
    }
}

/// Runs remote calls under a [`RetryPolicy`].
///
/// Transient errors are retried after the policy's backoff until the attempt
/// cap, then surface as [`Error::RetriesExhausted`]. Every other error is
/// returned untouched. Waits are raced against the cancellation token.
#[derive(Debug)]
pub struct ResilientFetch {
    policy: RetryPolicy,
    cancel: CancellationToken,
    waits: AtomicU32,
}

impl ResilientFetch {
    pub fn new(policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            policy,
            cancel,
            waits: AtomicU32::new(0),
        }
    }

    /// Backoff waits taken so far, across all operations.
    pub fn retry_waits(&self) -> u32 {
        self.waits.load(Ordering::Relaxed)
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled(operation.to_string()));
            }

            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => err,
                Err(err) => return Err(err),
            };

            if self.policy.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(Error::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay_for(attempt, err.retry_after());
            tracing::warn!(operation, attempt, ?delay, error = %err, "transient failure, retrying");
            self.waits.fetch_add(1, Ordering::Relaxed);

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(Error::Cancelled(operation.to_string()));
                }
                _ = sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}
