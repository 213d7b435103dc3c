//! Bounded retry with exponential backoff for out-of-process calls.
//!
//! [`call_with_retry`] never logs; callers observe each attempt through the
//! closure they pass in.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts including the first one. Zero is treated as one.
  pub max_attempts: u32,
  pub initial_backoff: Duration,
  pub multiplier: u32,
  pub max_backoff: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_backoff: Duration::from_secs(1),
      multiplier: 2,
      max_backoff: Duration::from_secs(30),
    }
  }
}

impl RetryPolicy {
  pub fn no_retry() -> Self {
    Self {
      max_attempts: 1,
      ..Default::default()
    }
  }

  /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
  pub fn backoff_for(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let factor = self.multiplier.max(1).saturating_pow(exponent);
    self
      .initial_backoff
      .saturating_mul(factor)
      .min(self.max_backoff)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
  pub value: T,
  pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure<E> {
  pub error: E,
  pub attempts: u32,
  /// False when the last error was permanent rather than out of attempts.
  pub exhausted: bool,
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts.
///
/// `operation` receives the 1-based attempt number.
pub async fn call_with_retry<T, E, F, Fut, R>(
  policy: &RetryPolicy,
  is_retryable: R,
  mut operation: F,
) -> Result<Retried<T>, RetryFailure<E>>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, E>>,
  R: Fn(&E) -> bool,
{
  let max_attempts = policy.max_attempts.max(1);
  let mut attempt = 1;

  loop {
    match operation(attempt).await {
      Ok(value) => return Ok(Retried { value, attempts: attempt }),
      Err(error) if !is_retryable(&error) => {
        return Err(RetryFailure {
          error,
          attempts: attempt,
          exhausted: false,
        });
      }
      Err(error) if attempt >= max_attempts => {
        return Err(RetryFailure {
          error,
          attempts: attempt,
          exhausted: true,
        });
      }
      Err(_) => {
        tokio::time::sleep(policy.backoff_for(attempt)).await;
        attempt += 1;
      }
    }
  }
}
