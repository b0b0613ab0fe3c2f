use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::errors::internal::AuthorizationError;
use crate::types::db::role::RoleKind;
use crate::types::db::{permission, role, role_permission, user_role};

/// Repository for roles, permissions and the role ↔ permission grants
#[derive(Debug, Default)]
pub struct RoleStore;

impl RoleStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_role(
        &self,
        conn: &impl ConnectionTrait,
        role_id: &str,
    ) -> Result<Option<role::Model>, InternalError> {
        role::Entity::find_by_id(role_id.to_owned())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_role", e))
    }

    pub async fn get_role(
        &self,
        conn: &impl ConnectionTrait,
        role_id: &str,
    ) -> Result<role::Model, InternalError> {
        self.find_role(conn, role_id)
            .await?
            .ok_or_else(|| AuthorizationError::RoleNotFound(role_id.to_string()).into())
    }

    pub async fn find_role_by_name(
        &self,
        conn: &impl ConnectionTrait,
        name: &str,
    ) -> Result<Option<role::Model>, InternalError> {
        role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_role_by_name", e))
    }

    pub async fn roles_by_ids(
        &self,
        conn: &impl ConnectionTrait,
        role_ids: &[String],
    ) -> Result<Vec<role::Model>, InternalError> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        role::Entity::find()
            .filter(role::Column::Id.is_in(role_ids.iter().cloned()))
            .all(conn)
            .await
            .map_err(|e| InternalError::database("roles_by_ids", e))
    }

    pub async fn create_role(
        &self,
        conn: &impl ConnectionTrait,
        name: &str,
        description: Option<String>,
        kind: RoleKind,
        is_system_role: bool,
        now: i64,
    ) -> Result<role::Model, InternalError> {
        if self.find_role_by_name(conn, name).await?.is_some() {
            return Err(AuthorizationError::DuplicateRoleName(name.to_string()).into());
        }

        role::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            description: Set(description),
            kind: Set(kind),
            is_system_role: Set(is_system_role),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("create_role", e))
    }

    pub async fn rename_role(
        &self,
        conn: &impl ConnectionTrait,
        role_id: &str,
        new_name: &str,
        now: i64,
    ) -> Result<role::Model, InternalError> {
        let existing = self.get_role(conn, role_id).await?;
        if existing.is_system_role {
            return Err(AuthorizationError::SystemRoleProtected(existing.name).into());
        }
        if let Some(clash) = self.find_role_by_name(conn, new_name).await? {
            if clash.id != existing.id {
                return Err(AuthorizationError::DuplicateRoleName(new_name.to_string()).into());
            }
        }

        let mut model: role::ActiveModel = existing.into();
        model.name = Set(new_name.to_string());
        model.updated_at = Set(now);
        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("rename_role", e))
    }

    pub async fn delete_role(
        &self,
        conn: &impl ConnectionTrait,
        role_id: &str,
    ) -> Result<(), InternalError> {
        let existing = self.get_role(conn, role_id).await?;
        if existing.is_system_role {
            return Err(AuthorizationError::SystemRoleProtected(existing.name).into());
        }

        user_role::Entity::delete_many()
            .filter(user_role::Column::RoleId.eq(role_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_role_assignments", e))?;
        existing
            .delete(conn)
            .await
            .map_err(|e| InternalError::database("delete_role", e))?;

        Ok(())
    }

    pub async fn find_permission(
        &self,
        conn: &impl ConnectionTrait,
        permission_id: &str,
    ) -> Result<Option<permission::Model>, InternalError> {
        permission::Entity::find_by_id(permission_id.to_owned())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_permission", e))
    }

    pub async fn get_permission(
        &self,
        conn: &impl ConnectionTrait,
        permission_id: &str,
    ) -> Result<permission::Model, InternalError> {
        self.find_permission(conn, permission_id)
            .await?
            .ok_or_else(|| AuthorizationError::PermissionNotFound(permission_id.to_string()).into())
    }

    pub async fn find_permission_by_code(
        &self,
        conn: &impl ConnectionTrait,
        code: &str,
    ) -> Result<Option<permission::Model>, InternalError> {
        permission::Entity::find()
            .filter(permission::Column::Code.eq(code))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_permission_by_code", e))
    }

    /// Insert a permission code, or return the existing row for it
    pub async fn ensure_permission(
        &self,
        conn: &impl ConnectionTrait,
        code: &str,
        description: Option<String>,
        now: i64,
    ) -> Result<permission::Model, InternalError> {
        if let Some(existing) = self.find_permission_by_code(conn, code).await? {
            return Ok(existing);
        }

        let module = code.split('.').next().unwrap_or(code).to_string();
        permission::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            code: Set(code.to_string()),
            module: Set(module),
            description: Set(description),
            created_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("create_permission", e))
    }

    /// Grant a permission to a role; both must exist
    pub async fn grant_permission_to_role(
        &self,
        conn: &impl ConnectionTrait,
        role_id: &str,
        permission_id: &str,
        now: i64,
    ) -> Result<role_permission::Model, InternalError> {
        self.get_role(conn, role_id).await?;
        self.get_permission(conn, permission_id).await?;

        let existing = role_permission::Entity::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .filter(role_permission::Column::PermissionId.eq(permission_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_role_permission", e))?;
        if existing.is_some() {
            return Err(AuthorizationError::DuplicateGrant.into());
        }

        role_permission::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            role_id: Set(role_id.to_string()),
            permission_id: Set(permission_id.to_string()),
            created_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("grant_role_permission", e))
    }

    /// Union of permission codes granted to any of `role_ids`
    pub async fn permission_codes_for_roles(
        &self,
        conn: &impl ConnectionTrait,
        role_ids: &[String],
    ) -> Result<BTreeSet<String>, InternalError> {
        if role_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let grants = role_permission::Entity::find()
            .filter(role_permission::Column::RoleId.is_in(role_ids.iter().cloned()))
            .all(conn)
            .await
            .map_err(|e| InternalError::database("find_role_permissions", e))?;

        let permission_ids: BTreeSet<String> =
            grants.into_iter().map(|grant| grant.permission_id).collect();

        permission_codes(conn, permission_ids).await
    }
}

/// Resolve permission ids to their codes
pub(crate) async fn permission_codes(
    conn: &impl ConnectionTrait,
    permission_ids: BTreeSet<String>,
) -> Result<BTreeSet<String>, InternalError> {
    if permission_ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let permissions = permission::Entity::find()
        .filter(permission::Column::Id.is_in(permission_ids))
        .all(conn)
        .await
        .map_err(|e| InternalError::database("find_permissions", e))?;

    Ok(permissions.into_iter().map(|p| p.code).collect())
}
