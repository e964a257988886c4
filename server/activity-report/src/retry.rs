//! Per-call timeout with bounded exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ReportError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
  /// Attempts including the first one. Values below 1 are treated as 1.
  pub max_attempts: u32,
  /// Delay before the second attempt; doubles after each failure.
  pub initial_backoff: Duration,
  /// Upper bound for a single attempt of [`run`](Self::run).
  pub timeout: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_backoff: Duration::from_millis(250),
      timeout: Duration::from_secs(30),
    }
  }
}

impl RetryPolicy {
  /// Run `op` until it succeeds, fails with a non-retryable error, or attempts run out.
  /// Each attempt is bounded by `timeout`.
  ///
  /// `index` names the store target in timeout errors and logs.
  pub async fn run<T, F, Fut>(&self, index: &str, op: F) -> Result<T, ReportError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReportError>>,
  {
    self.attempt(index, Some(self.timeout), op).await
  }

  /// Like [`run`](Self::run), without the per-attempt bound. For operations
  /// that bound each of their own requests and must clean up on failure, such
  /// as a paged scan holding a scroll context.
  pub async fn run_untimed<T, F, Fut>(&self, index: &str, op: F) -> Result<T, ReportError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReportError>>,
  {
    self.attempt(index, None, op).await
  }

  async fn attempt<T, F, Fut>(
    &self,
    index: &str,
    timeout: Option<Duration>,
    mut op: F,
  ) -> Result<T, ReportError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReportError>>,
  {
    let max_attempts = self.max_attempts.max(1);
    let mut backoff = self.initial_backoff;
    let mut attempt = 1;

    loop {
      let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, op()).await {
          Ok(r) => r,
          Err(_) => Err(ReportError::Timeout {
            index: index.to_string(),
            after: limit,
          }),
        },
        None => op().await,
      };

      match result {
        Ok(v) => return Ok(v),
        Err(e) if attempt < max_attempts && e.is_retryable() => {
          warn!(index, attempt, max_attempts, error = %e, "store call failed; retrying");
          tokio::time::sleep(backoff).await;
          backoff = backoff.saturating_mul(2);
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }
}
