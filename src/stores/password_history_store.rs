use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::errors::InternalError;
use crate::types::db::password_history;

/// Append-only store of retired password hashes
#[derive(Debug, Default)]
pub struct PasswordHistoryStore;

impl PasswordHistoryStore {
    pub fn new() -> Self {
        Self
    }

    /// Most recent `limit` entries for a user, newest first
    pub async fn recent(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<password_history::Model>, InternalError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        password_history::Entity::find()
            .filter(password_history::Column::UserId.eq(user_id))
            .order_by_desc(password_history::Column::ChangedAt)
            .order_by_desc(password_history::Column::Id)
            .limit(limit)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("recent_password_history", e))
    }

    pub async fn append(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        password_hash: &str,
        changed_at: i64,
    ) -> Result<(), InternalError> {
        password_history::ActiveModel {
            id: NotSet,
            user_id: Set(user_id.to_string()),
            password_hash: Set(password_hash.to_string()),
            changed_at: Set(changed_at),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("append_password_history", e))?;

        Ok(())
    }
}
