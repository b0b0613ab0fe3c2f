use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::errors::internal::AuthorizationError;
use crate::types::db::facility;

/// Repository for facilities (read-mostly; facilities are managed elsewhere)
#[derive(Debug, Default)]
pub struct FacilityStore;

impl FacilityStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        facility_id: &str,
    ) -> Result<Option<facility::Model>, InternalError> {
        facility::Entity::find_by_id(facility_id.to_owned())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_facility", e))
    }

    pub async fn get_by_id(
        &self,
        conn: &impl ConnectionTrait,
        facility_id: &str,
    ) -> Result<facility::Model, InternalError> {
        self.find_by_id(conn, facility_id)
            .await?
            .ok_or_else(|| AuthorizationError::FacilityNotFound(facility_id.to_string()).into())
    }

    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        name: &str,
        now: i64,
    ) -> Result<facility::Model, InternalError> {
        facility::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("create_facility", e))
    }
}
