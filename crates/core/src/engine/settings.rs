use std::time::Duration;

use crate::document::OwnerId;

/// Owner whose site the public page shows when nothing has been published.
pub const DEFAULT_FALLBACK_OWNER: &str = "site-owner";

/// Configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Last tier of the public resolution chain.
    pub fallback_owner: OwnerId,
    /// Treat the cached last-known owner as an explicit owner request.
    /// Local development only.
    pub local_owner_override: bool,
    /// Retry policy for provisioning writes.
    pub retry: RetryConfig,
    /// Capacity of the notification channel.
    pub event_capacity: usize,
}

impl EngineSettings {
    pub fn new(fallback_owner: impl Into<OwnerId>) -> Self {
        Self {
            fallback_owner: fallback_owner.into(),
            local_owner_override: false,
            retry: RetryConfig::default(),
            event_capacity: 64,
        }
    }

    pub fn with_local_owner_override(mut self, enabled: bool) -> Self {
        self.local_owner_override = enabled;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_OWNER)
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (1-indexed; 0 means no delay).
    /// Multipliers below 1.0, negative or NaN ones included, act as 1.0.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let cap = self.max_delay.as_secs_f64() / self.initial_delay.as_secs_f64();
        if !factor.is_finite() || factor >= cap {
            return self.max_delay;
        }
        self.initial_delay.mul_f64(factor).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
