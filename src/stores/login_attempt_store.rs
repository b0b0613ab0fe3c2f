use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::errors::InternalError;
use crate::types::db::login_attempt;
use crate::types::internal::rate_limit::{AttemptEntry, AttemptTransition, RateLimitPolicy};

/// Pure state transition applied to one key's entry (`None` when the key is unknown)
pub type TransitionFn = dyn Fn(Option<AttemptEntry>) -> AttemptTransition + Send + Sync;

/// Storage for per-client login attempt counters
///
/// `apply` must run the read, the transition and the write as one atomic step
/// per key so concurrent attempts from one client cannot lose increments.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn apply(
        &self,
        client_key: &str,
        transition: &TransitionFn,
    ) -> Result<AttemptTransition, InternalError>;

    async fn remove(&self, client_key: &str) -> Result<(), InternalError>;

    /// Drop entries that are neither blocked nor inside a live window; returns how many went
    async fn evict_stale(
        &self,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<u64, InternalError>;
}

/// Process-local attempt table
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    entries: DashMap<String, AttemptEntry>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, client_key: &str) -> Option<AttemptEntry> {
        self.entries.get(client_key).map(|entry| *entry)
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn apply(
        &self,
        client_key: &str,
        transition: &TransitionFn,
    ) -> Result<AttemptTransition, InternalError> {
        // The entry guard holds the shard lock for the whole read-modify-write
        let result = match self.entries.entry(client_key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let result = transition(Some(*occupied.get()));
                *occupied.get_mut() = result.entry;
                result
            }
            Entry::Vacant(vacant) => {
                let result = transition(None);
                vacant.insert(result.entry);
                result
            }
        };

        Ok(result)
    }

    async fn remove(&self, client_key: &str) -> Result<(), InternalError> {
        self.entries.remove(client_key);
        Ok(())
    }

    async fn evict_stale(
        &self,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<u64, InternalError> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_stale(now, policy));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

/// Attempt table in the auth database, shared by every instance using it
#[derive(Debug, Clone)]
pub struct DatabaseAttemptStore {
    db: DatabaseConnection,
}

impl DatabaseAttemptStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttemptStore for DatabaseAttemptStore {
    async fn apply(
        &self,
        client_key: &str,
        transition: &TransitionFn,
    ) -> Result<AttemptTransition, InternalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;

        let existing = login_attempt::Entity::find_by_id(client_key.to_owned())
            .one(&txn)
            .await
            .map_err(|e| InternalError::database("find_login_attempt", e))?;

        let current = match &existing {
            Some(row) => to_entry(row),
            None => None,
        };
        let result = transition(current);
        let entry = result.entry;

        match existing {
            Some(row) => {
                let mut model: login_attempt::ActiveModel = row.into();
                model.count = Set(entry.count as i32);
                model.window_start = Set(entry.window_start.timestamp_millis());
                model.blocked_until = Set(entry.blocked_until.map(|t| t.timestamp_millis()));
                model
                    .update(&txn)
                    .await
                    .map_err(|e| InternalError::database("update_login_attempt", e))?;
            }
            None => {
                login_attempt::ActiveModel {
                    client_key: Set(client_key.to_string()),
                    count: Set(entry.count as i32),
                    window_start: Set(entry.window_start.timestamp_millis()),
                    blocked_until: Set(entry.blocked_until.map(|t| t.timestamp_millis())),
                }
                .insert(&txn)
                .await
                .map_err(|e| InternalError::database("insert_login_attempt", e))?;
            }
        }

        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        Ok(result)
    }

    async fn remove(&self, client_key: &str) -> Result<(), InternalError> {
        login_attempt::Entity::delete_by_id(client_key.to_owned())
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("delete_login_attempt", e))?;
        Ok(())
    }

    async fn evict_stale(
        &self,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<u64, InternalError> {
        let cutoff = (now - (policy.window + policy.block_duration)).timestamp_millis();
        let now_ms = now.timestamp_millis();

        let result = login_attempt::Entity::delete_many()
            .filter(login_attempt::Column::WindowStart.lte(cutoff))
            .filter(
                Condition::any()
                    .add(login_attempt::Column::BlockedUntil.is_null())
                    .add(login_attempt::Column::BlockedUntil.lte(now_ms)),
            )
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("evict_login_attempts", e))?;

        Ok(result.rows_affected)
    }
}

/// Rows with unreadable timestamps are treated as absent and overwritten
fn to_entry(row: &login_attempt::Model) -> Option<AttemptEntry> {
    let window_start = DateTime::from_timestamp_millis(row.window_start)?;
    let blocked_until = match row.blocked_until {
        Some(ms) => Some(DateTime::from_timestamp_millis(ms)?),
        None => None,
    };

    Some(AttemptEntry {
        count: u32::try_from(row.count).unwrap_or(0),
        window_start,
        blocked_until,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::internal::rate_limit::RateLimitDecision;
    use chrono::Duration;

    fn bump(now: DateTime<Utc>) -> impl Fn(Option<AttemptEntry>) -> AttemptTransition {
        move |entry| {
            let mut entry = entry.unwrap_or_else(|| AttemptEntry::fresh(now));
            entry.count += 1;
            AttemptTransition {
                entry,
                decision: RateLimitDecision::Allow,
                block_started: false,
            }
        }
    }

    #[tokio::test]
    async fn test_in_memory_apply_accumulates_per_key() {
        let store = InMemoryAttemptStore::new();
        let now = Utc::now();

        store.apply("10.0.0.1", &bump(now)).await.unwrap();
        store.apply("10.0.0.1", &bump(now)).await.unwrap();
        store.apply("10.0.0.2", &bump(now)).await.unwrap();

        assert_eq!(store.get("10.0.0.1").unwrap().count, 2);
        assert_eq!(store.get("10.0.0.2").unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_in_memory_evicts_only_stale_entries() {
        let store = InMemoryAttemptStore::new();
        let policy = RateLimitPolicy::default();
        let start = Utc::now();

        store.apply("old", &bump(start)).await.unwrap();
        let later = start + policy.window + policy.block_duration;
        store.apply("new", &bump(later)).await.unwrap();

        let removed = store.evict_stale(later, &policy).await.unwrap();

        assert_eq!(removed, 1);
        assert!(store.get("old").is_none());
        assert!(store.get("new").is_some());
    }

    #[tokio::test]
    async fn test_in_memory_keeps_blocked_entries() {
        let store = InMemoryAttemptStore::new();
        let policy = RateLimitPolicy::default();
        let start = Utc::now();
        let later = start + Duration::hours(1);

        store
            .apply("blocked", &move |_| AttemptTransition {
                entry: AttemptEntry {
                    count: 6,
                    window_start: start,
                    blocked_until: Some(later + Duration::minutes(1)),
                },
                decision: RateLimitDecision::Blocked {
                    retry_after_seconds: 60,
                },
                block_started: true,
            })
            .await
            .unwrap();

        assert_eq!(store.evict_stale(later, &policy).await.unwrap(), 0);
        assert!(store.get("blocked").is_some());
    }
}
