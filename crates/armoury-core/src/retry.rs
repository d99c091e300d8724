//! Capped exponential backoff for transient store failures.

use std::{future::Future, time::Duration};

use crate::Result;

/// How many times, and how patiently, a read is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: usize,
  pub base_delay:   Duration,
  pub max_delay:    Duration,
}

impl RetryPolicy {
  pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      base_delay,
      max_delay: max_delay.max(base_delay),
    }
  }

  /// A single attempt; nothing is retried.
  pub fn never() -> Self { Self::new(1, Duration::ZERO, Duration::ZERO) }

  /// Delay before retry number `attempt + 1`.
  pub fn delay_for(&self, attempt: usize) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.min(31) as u32);
    self.base_delay.saturating_mul(factor).min(self.max_delay)
  }

  /// Run `op` until it succeeds, fails with a non-transient error, or the
  /// attempts run out. The last error is returned.
  pub async fn run<F, Fut, T>(&self, what: &'static str, mut op: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let mut attempt = 0;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
          let delay = self.delay_for(attempt);
          tracing::warn!(
            operation = what,
            attempt = attempt + 1,
            ?delay,
            error = %err,
            "transient store failure; retrying"
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(err) => return Err(err),
      }
    }
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::new(3, Duration::from_millis(100), Duration::from_secs(2))
  }
}
