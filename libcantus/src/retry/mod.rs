//! Retry with exponential backoff and an overall deadline.
//!
//! Only transient errors ([`CantusError::is_transient`]) are retried. When
//! the attempts run out, the last transient error is wrapped into a
//! [`CantusError::SourceSystem`] attributed to the registry. Terminal errors
//! are returned as they are, after a single attempt.

use crate::config::Retry;
use crate::error::{CantusError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};


/// Exponential backoff delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// The delay before the next attempt
    pub delay: Duration,

    /// The factor the delay grows by after each attempt
    pub exponent: u32,

    /// Upper bound for `delay`
    pub max_delay: Duration,
}

impl Backoff {
    pub fn new(delay: Duration, exponent: u32, max_delay: Duration) -> Self {
        Self {
            delay: delay.min(max_delay),
            exponent,
            max_delay,
        }
    }

    /// The backoff for the attempt after this one, capped at `max_delay`.
    pub fn increment(&self) -> Self {
        let delay = self
            .delay
            .checked_mul(self.exponent)
            .map_or(self.max_delay, |d| d.min(self.max_delay));

        Self {
            delay,
            exponent: self.exponent,
            max_delay: self.max_delay,
        }
    }
}

/// How many times, how far apart, and for how long a call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub backoff: Backoff,
    /// Bound on the whole operation, retries and backoff included
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&Retry::default())
    }
}

impl From<&Retry> for RetryPolicy {
    fn from(config: &Retry) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Backoff::new(config.min_backoff(), 2, config.max_backoff()),
            deadline: config.deadline(),
        }
    }
}

impl RetryPolicy {
    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Runs `operation` until it succeeds, fails terminally, runs out of
    /// attempts, or the deadline expires.
    ///
    /// `registry` is used to attribute the final failure and `context` is
    /// added to its message.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::retry::RetryPolicy;
    ///
    /// # async fn example() -> libcantus::error::Result<()> {
    /// let policy = RetryPolicy::default();
    /// let value = policy.run("docker.io", "example", || async { Ok(42) }).await?;
    /// assert_eq!(value, 42);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<T, F, Fut>(&self, registry: &str, context: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = async {
            let mut backoff = self.backoff;
            let mut attempt: u32 = 1;

            loop {
                match operation().await {
                    Ok(value) => return Ok(value),
                    Err(err) if err.is_transient() && attempt < self.max_attempts() => {
                        debug!(
                            "Retrying {} against {} after attempt {} in {:?}: {}",
                            context, registry, attempt, backoff.delay, err
                        );
                        tokio::time::sleep(backoff.delay).await;
                        backoff = backoff.increment();
                        attempt += 1;
                    }
                    Err(err) if err.is_transient() => {
                        warn!(
                            "Giving up {} against {} after {} attempts: {}",
                            context, registry, attempt, err
                        );
                        return Err(err.into_source_system(registry, attempt, context));
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        match tokio::time::timeout(self.deadline, attempts).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Deadline of {:?} expired for {} against {}",
                    self.deadline, context, registry
                );
                Err(CantusError::source_system(
                    registry,
                    format!(
                        "Operation did not complete within {:?} {}",
                        self.deadline, context
                    ),
                ))
            }
        }
    }
}
