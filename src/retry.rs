#![forbid(unsafe_code)]

//! Bounded retry loop with exponential backoff for upstream API calls.

use anyhow::Result;
use std::thread;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Sleep applied after the zero-based `attempt` failed: `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent.
    /// The error of the final attempt is returned unchanged.
    pub fn run<T, F>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 < attempts => {
                    let backoff = self.delay_for(attempt);
                    eprintln!(
                        "  Warning: {label} failed (attempt {}/{attempts}): {err:#}; retrying in {backoff:?}",
                        attempt + 1
                    );
                    thread::sleep(backoff);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
