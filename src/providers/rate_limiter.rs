use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::audit::AuditLogger;
use crate::providers::clock::Clock;
use crate::stores::AttemptStore;
use crate::types::internal::context::RequestContext;
use crate::types::internal::rate_limit::{
    AttemptEntry, AttemptTransition, RateLimitDecision, RateLimitPolicy,
};

/// Feed one login attempt through the sliding window
///
/// A running block rejects without counting. An expired block or an elapsed
/// window starts a fresh window. The attempt that pushes the count past
/// `max_attempts` starts a block and is itself rejected.
pub fn evaluate(
    entry: Option<AttemptEntry>,
    now: DateTime<Utc>,
    policy: &RateLimitPolicy,
) -> AttemptTransition {
    let mut entry = entry.unwrap_or_else(|| AttemptEntry::fresh(now));

    if let Some(until) = entry.blocked_until {
        if now < until {
            return AttemptTransition {
                entry,
                decision: RateLimitDecision::Blocked {
                    retry_after_seconds: retry_after(until - now),
                },
                block_started: false,
            };
        }
    }

    if entry.blocked_until.is_some() || now - entry.window_start >= policy.window {
        entry = AttemptEntry::fresh(now);
    }

    entry.count = entry.count.saturating_add(1);

    if entry.count > policy.max_attempts {
        entry.blocked_until = Some(now + policy.block_duration);
        return AttemptTransition {
            entry,
            decision: RateLimitDecision::Blocked {
                retry_after_seconds: retry_after(policy.block_duration),
            },
            block_started: true,
        };
    }

    AttemptTransition {
        entry,
        decision: RateLimitDecision::Allow,
        block_started: false,
    }
}

/// Whole seconds, rounded up, never below one
fn retry_after(remaining: Duration) -> u64 {
    let millis = remaining.num_milliseconds().max(1);
    let seconds = (millis + 999) / 1000;
    u64::try_from(seconds).unwrap_or(1).max(1)
}

/// Per-client login attempt limiter
///
/// Fails open: when the attempt store errors the attempt is allowed and the
/// failure logged. Stale entries are evicted from `check` at most once per
/// cleanup interval.
pub struct LoginRateLimiter {
    store: Arc<dyn AttemptStore>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
    audit_logger: Arc<AuditLogger>,
    last_cleanup: Mutex<DateTime<Utc>>,
}

impl LoginRateLimiter {
    pub fn new(
        store: Arc<dyn AttemptStore>,
        policy: RateLimitPolicy,
        clock: Arc<dyn Clock>,
        audit_logger: Arc<AuditLogger>,
    ) -> Self {
        let started = clock.now();
        Self {
            store,
            policy,
            clock,
            audit_logger,
            last_cleanup: Mutex::new(started),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Count an attempt from the request's client key and decide whether it may proceed
    pub async fn check(&self, ctx: &RequestContext) -> RateLimitDecision {
        let client_key = ctx.client_key();
        let now = self.clock.now();

        self.maybe_cleanup(now).await;

        let policy = self.policy;
        let transition = match self
            .store
            .apply(&client_key, &move |entry| evaluate(entry, now, &policy))
            .await
        {
            Ok(transition) => transition,
            Err(e) => {
                tracing::warn!(
                    "Rate limiter store failed for {}, allowing attempt: {}",
                    client_key,
                    e
                );
                return RateLimitDecision::Allow;
            }
        };

        if transition.block_started {
            tracing::warn!(
                "Blocking login attempts from {} for {}s",
                client_key,
                self.policy.block_duration.num_seconds()
            );
            if let Err(e) = self
                .audit_logger
                .log_rate_limit_block(
                    ctx,
                    &client_key,
                    self.policy.block_duration.num_seconds(),
                    transition.entry.count,
                )
                .await
            {
                tracing::error!("Failed to log rate limit block: {}", e);
            }
        }

        transition.decision
    }

    /// Forget a client key, used after a successful login
    pub async fn reset(&self, client_key: &str) {
        if let Err(e) = self.store.remove(client_key).await {
            tracing::warn!("Failed to reset rate limit for {}: {}", client_key, e);
        }
    }

    /// Evict stale entries; returns how many were removed
    pub async fn cleanup(&self, now: DateTime<Utc>) -> u64 {
        match self.store.evict_stale(now, &self.policy).await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::debug!("Evicted {} stale rate limit entries", removed);
                }
                removed
            }
            Err(e) => {
                tracing::warn!("Rate limit cleanup failed: {}", e);
                0
            }
        }
    }

    async fn maybe_cleanup(&self, now: DateTime<Utc>) {
        let due = {
            let mut last = self
                .last_cleanup
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if now - *last >= self.policy.cleanup_interval {
                *last = now;
                true
            } else {
                false
            }
        };

        if due {
            self.cleanup(now).await;
        }
    }
}
