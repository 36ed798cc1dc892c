use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use super::StoreError;
use crate::logging::LogContext;

/// Bounded retry with a linearly growing pause: attempt `n + 1` waits `n * base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Pause taken before `attempt` (1-based). The first attempt runs immediately.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_sub(1)
    }

    /// Runs `call` until it succeeds, fails with a non-transient error, or the attempts
    /// run out. `call` receives the 1-based attempt number.
    ///
    /// Failures come back wrapped in [`StoreError::Operation`] carrying `operation`
    /// and the number of attempts made. The policy does not know whether the call is
    /// idempotent; a write whose acknowledgement was lost will be sent again.
    pub async fn run<F, Fut, T>(
        &self,
        operation: &'static str,
        log: &LogContext,
        mut call: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match call(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(target: log.target(), "{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_before(attempt + 1);
                    warn!(
                        target: log.target(),
                        "{} failed on attempt {}/{}, retrying in {:?}: {}",
                        operation, attempt, max_attempts, delay, err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(StoreError::Operation {
                        operation,
                        attempts: attempt,
                        source: Box::new(err),
                    })
                }
            }
        }
    }
}
