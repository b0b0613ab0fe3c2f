use chrono::{DateTime, Duration, Utc};

/// Counter state for one client key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptEntry {
    pub count: u32,
    pub window_start: DateTime<Utc>,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl AttemptEntry {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
            blocked_until: None,
        }
    }

    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    /// Eligible for eviction: not blocked and untouched for a full window plus block period
    pub fn is_stale(&self, now: DateTime<Utc>, policy: &RateLimitPolicy) -> bool {
        !self.is_blocked(now) && now - self.window_start >= policy.window + policy.block_duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    Blocked { retry_after_seconds: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Result of feeding one attempt through the limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTransition {
    /// State to persist for the key
    pub entry: AttemptEntry,
    pub decision: RateLimitDecision,
    /// True only on the attempt that started a block
    pub block_started: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Attempts allowed per window; the next one is blocked
    pub max_attempts: u32,
    pub window: Duration,
    pub block_duration: Duration,
    pub cleanup_interval: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(15),
            block_duration: Duration::minutes(15),
            cleanup_interval: Duration::minutes(5),
        }
    }
}
