use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::config::AUDIT_TARGET;
use crate::errors::InternalError;
use crate::errors::internal::AuditError;
use crate::types::db::audit_event;
use crate::types::internal::audit::AuditEvent;

/// Repository for audit event storage operations
///
/// Owns the audit database connection, which is separate from the auth database.
#[derive(Debug, Clone)]
pub struct AuditStore {
    db: DatabaseConnection,
}

impl AuditStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Write an audit event to the database and mirror it to the `audit` tracing target
    ///
    /// The tracing record is emitted before the insert so the SIEM feed still
    /// sees the event when the database write fails.
    ///
    /// # Errors
    ///
    /// Returns `InternalError` if serialization or database insert fails
    pub async fn write_event(&self, event: AuditEvent) -> Result<(), InternalError> {
        let data_json = serde_json::to_string(&event.data).map_err(|e| {
            AuditError::LogWriteFailed(format!("Failed to serialize audit data: {}", e))
        })?;

        let timestamp = Utc::now().to_rfc3339();
        // Events like LOGIN_FAILURE may have no resolvable actor
        let actor_id = event.actor_id.unwrap_or_else(|| "unknown".to_string());

        tracing::info!(
            target: AUDIT_TARGET,
            event_type = %event.event_type,
            actor_id = %actor_id,
            ip_address = event.ip_address.as_deref().unwrap_or("unknown"),
            jwt_id = event.jwt_id.as_deref().unwrap_or(""),
            data = %data_json,
            timestamp = %timestamp,
            "audit event"
        );

        audit_event::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            timestamp: Set(timestamp),
            event_type: Set(event.event_type.to_string()),
            actor_id: Set(actor_id),
            ip_address: Set(event.ip_address),
            jwt_id: Set(event.jwt_id),
            data: Set(data_json),
        }
        .insert(&self.db)
        .await
        .map_err(|e| InternalError::database("write_audit_event", e))?;

        Ok(())
    }

    /// Stored events of one type, oldest first
    pub async fn events_by_type(
        &self,
        event_type: &str,
    ) -> Result<Vec<audit_event::Model>, InternalError> {
        audit_event::Entity::find()
            .filter(audit_event::Column::EventType.eq(event_type))
            .order_by_asc(audit_event::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("events_by_type", e))
    }
}
