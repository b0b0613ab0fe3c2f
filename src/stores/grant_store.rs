use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::errors::internal::{AuthorizationError, CredentialError};
use crate::stores::role_store::permission_codes;
use crate::types::db::{facility, permission, role, user, user_permission, user_role};

/// New role assignment as requested by an administrator
#[derive(Debug, Clone, Default)]
pub struct NewAssignment {
    pub user_id: String,
    pub role_id: String,
    pub facility_id: Option<String>,
    pub department_id: Option<String>,
}

/// Repository for user ↔ role assignments and direct user permission grants
///
/// Every write re-checks that the referenced rows exist on the same connection,
/// so callers running inside a transaction get the check and the insert atomically.
#[derive(Debug, Default)]
pub struct GrantStore;

impl GrantStore {
    pub fn new() -> Self {
        Self
    }

    /// One of the user's assignments with its role
    pub async fn find_assignment(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<(user_role::Model, role::Model)>, InternalError> {
        let row = user_role::Entity::find_by_id(assignment_id.to_owned())
            .filter(user_role::Column::UserId.eq(user_id))
            .find_also_related(role::Entity)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_assignment", e))?;

        Ok(row.and_then(|(assignment, role)| role.map(|role| (assignment, role))))
    }

    /// Assignments paired with their role rows, oldest first
    pub async fn assignments_with_roles(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<Vec<(user_role::Model, role::Model)>, InternalError> {
        let rows = user_role::Entity::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .order_by_asc(user_role::Column::CreatedAt)
            .find_also_related(role::Entity)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("assignments_with_roles", e))?;

        Ok(rows
            .into_iter()
            .filter_map(|(assignment, role)| role.map(|role| (assignment, role)))
            .collect())
    }

    pub async fn assign_role(
        &self,
        conn: &impl ConnectionTrait,
        assignment: NewAssignment,
        now: i64,
    ) -> Result<user_role::Model, InternalError> {
        ensure_user(conn, &assignment.user_id).await?;

        role::Entity::find_by_id(assignment.role_id.clone())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_role", e))?
            .ok_or_else(|| AuthorizationError::RoleNotFound(assignment.role_id.clone()))?;

        if let Some(facility_id) = &assignment.facility_id {
            facility::Entity::find_by_id(facility_id.clone())
                .one(conn)
                .await
                .map_err(|e| InternalError::database("find_facility", e))?
                .ok_or_else(|| AuthorizationError::FacilityNotFound(facility_id.clone()))?;
        }

        // SQLite unique indexes treat NULL facility ids as distinct
        let mut duplicate_query = user_role::Entity::find()
            .filter(user_role::Column::UserId.eq(assignment.user_id.as_str()))
            .filter(user_role::Column::RoleId.eq(assignment.role_id.as_str()));
        duplicate_query = match &assignment.facility_id {
            Some(facility_id) => {
                duplicate_query.filter(user_role::Column::FacilityId.eq(facility_id.as_str()))
            }
            None => duplicate_query.filter(user_role::Column::FacilityId.is_null()),
        };
        let duplicate = duplicate_query
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_duplicate_assignment", e))?;
        if duplicate.is_some() {
            return Err(AuthorizationError::DuplicateAssignment.into());
        }

        user_role::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(assignment.user_id),
            role_id: Set(assignment.role_id),
            facility_id: Set(assignment.facility_id),
            department_id: Set(assignment.department_id),
            created_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("assign_role", e))
    }

    /// Remove one assignment; it must belong to `user_id`
    pub async fn remove_assignment(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<user_role::Model, InternalError> {
        let assignment = user_role::Entity::find_by_id(assignment_id.to_owned())
            .filter(user_role::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_assignment", e))?
            .ok_or_else(|| AuthorizationError::AssignmentNotFound(assignment_id.to_string()))?;

        assignment
            .clone()
            .delete(conn)
            .await
            .map_err(|e| InternalError::database("remove_assignment", e))?;

        Ok(assignment)
    }

    pub async fn grant_permission(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        permission_id: &str,
        granted_by: Option<String>,
        now: i64,
    ) -> Result<user_permission::Model, InternalError> {
        ensure_user(conn, user_id).await?;

        permission::Entity::find_by_id(permission_id.to_owned())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_permission", e))?
            .ok_or_else(|| AuthorizationError::PermissionNotFound(permission_id.to_string()))?;

        if self.find_grant(conn, user_id, permission_id).await?.is_some() {
            return Err(AuthorizationError::DuplicateGrant.into());
        }

        user_permission::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            permission_id: Set(permission_id.to_string()),
            granted_by: Set(granted_by),
            granted_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("grant_permission", e))
    }

    pub async fn revoke_permission(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        permission_id: &str,
    ) -> Result<user_permission::Model, InternalError> {
        let grant = self
            .find_grant(conn, user_id, permission_id)
            .await?
            .ok_or_else(|| AuthorizationError::GrantNotFound(permission_id.to_string()))?;

        grant
            .clone()
            .delete(conn)
            .await
            .map_err(|e| InternalError::database("revoke_permission", e))?;

        Ok(grant)
    }

    /// Codes of every permission granted directly to the user
    pub async fn direct_permission_codes(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<BTreeSet<String>, InternalError> {
        let grants = user_permission::Entity::find()
            .filter(user_permission::Column::UserId.eq(user_id))
            .all(conn)
            .await
            .map_err(|e| InternalError::database("direct_permissions", e))?;

        permission_codes(conn, grants.into_iter().map(|g| g.permission_id).collect()).await
    }

    async fn find_grant(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        permission_id: &str,
    ) -> Result<Option<user_permission::Model>, InternalError> {
        user_permission::Entity::find()
            .filter(user_permission::Column::UserId.eq(user_id))
            .filter(user_permission::Column::PermissionId.eq(permission_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_grant", e))
    }
}

async fn ensure_user(conn: &impl ConnectionTrait, user_id: &str) -> Result<(), InternalError> {
    let found = user::Entity::find_by_id(user_id.to_owned())
        .filter(user::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .map_err(|e| InternalError::database("find_user", e))?;

    match found {
        Some(_) => Ok(()),
        None => Err(CredentialError::UserIdNotFound {
            user_id: user_id.to_string(),
        }
        .into()),
    }
}
