//! Bounded retry with exponential backoff
//!
//! A delivery gets at most `max_attempts` tries and one overall deadline.
//! Rate-limit responses are honoured exactly; everything else backs off
//! exponentially with jitter.

use super::transport::WebhookError;
use rand::Rng;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total tries including the first one
    pub max_attempts: u32,
    /// Deadline covering every attempt and every wait in between
    pub timeout: Duration,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Delay is randomized by +/- this fraction
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            timeout: Duration::from_secs(10),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
            jitter_factor: 0.25,
        }
    }
}

/// Delivery gave up
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("webhook delivery failed after {attempts} attempt(s): {source}")]
pub struct DeliveryError {
    pub attempts: u32,
    #[source]
    pub source: WebhookError,
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before the next attempt, or `None` to give up.
    ///
    /// `attempt` is the number of attempts already made.
    pub fn next_delay(&self, attempt: u32, err: &WebhookError) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        if let Some(wait) = err.retry_after() {
            return Some(wait);
        }
        if err.retryable() == Some(false) {
            return None;
        }
        Some(self.backoff(attempt))
    }

    /// Backoff after `attempt` failed attempts (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.0..=1.0);
        self.backoff_with_jitter(attempt, jitter)
    }

    /// Backoff with an explicit jitter sample in `[0, 1]`
    pub fn backoff_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = self.multiplier.powi(attempt.saturating_sub(1).min(64) as i32);
        let base_us = (self.initial_delay.as_micros() as f64 * exp)
            .min(self.max_delay.as_micros() as f64);
        let offset = (jitter * 2.0 - 1.0) * base_us * self.jitter_factor;
        Duration::from_micros((base_us + offset).max(1.0) as u64)
    }

    /// Drive `send` until it succeeds, the policy gives up, or the
    /// deadline passes. `send` receives the attempt number and the time
    /// left before the deadline.
    ///
    /// Returns the number of attempts made.
    pub fn run<F>(&self, mut send: F) -> Result<u32, DeliveryError>
    where
        F: FnMut(u32, Duration) -> Result<(), WebhookError>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut attempt = 0;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DeliveryError {
                    attempts: attempt,
                    source: WebhookError::Timeout(self.timeout),
                });
            }

            attempt += 1;
            let err = match send(attempt, remaining) {
                Ok(()) => return Ok(attempt),
                Err(err) => err,
            };

            let Some(delay) = self.next_delay(attempt, &err) else {
                return Err(DeliveryError {
                    attempts: attempt,
                    source: err,
                });
            };
            if delay >= deadline.saturating_duration_since(Instant::now()) {
                return Err(DeliveryError {
                    attempts: attempt,
                    source: WebhookError::Timeout(self.timeout),
                });
            }

            tracing::debug!(attempt, ?delay, error = %err, "retrying webhook delivery");
            thread::sleep(delay);
        }
    }
}
