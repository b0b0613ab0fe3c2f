use std::sync::Arc;

use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::app_data::AppData;
use crate::audit::AuditLogger;
use crate::errors::InternalError;
use crate::providers::Clock;
use crate::stores::{GrantStore, NewAssignment, RoleStore, UserStore};
use crate::types::db::{role, role_permission, user, user_permission, user_role};
use crate::types::internal::context::RequestContext;

/// Event types written through the audit builder
const ROLE_PERMISSION_GRANTED: &str = "ROLE_PERMISSION_GRANTED";
const ACCOUNT_REMOVED: &str = "ACCOUNT_REMOVED";

/// Orchestrates access administration: role assignments, direct grants,
/// role permissions and account activation
///
/// Callers are authorized by the route guard before any method here runs.
/// Writes that reference other rows run in a transaction together with the
/// existence checks.
pub struct AdminCoordinator {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    user_store: Arc<UserStore>,
    role_store: Arc<RoleStore>,
    grant_store: Arc<GrantStore>,
    audit_logger: Arc<AuditLogger>,
}

impl AdminCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.connections.auth.clone(),
            clock: Arc::clone(&app_data.clock),
            user_store: Arc::clone(&app_data.user_store),
            role_store: Arc::clone(&app_data.role_store),
            grant_store: Arc::clone(&app_data.grant_store),
            audit_logger: Arc::clone(&app_data.audit_logger),
        }
    }

    /// Facility an assignment of `role_id` grants access in
    ///
    /// Super admin roles reach every facility, so assigning one is an unscoped
    /// write whatever facility the request carries. An unknown role keeps the
    /// requested facility; the assignment itself reports it.
    pub async fn assignment_target(
        &self,
        role_id: &str,
        facility_id: Option<&str>,
    ) -> Result<Option<String>, InternalError> {
        let role = self.role_store.find_role(&self.db, role_id).await?;
        if role.is_some_and(|role| role.is_super_admin()) {
            return Ok(None);
        }
        Ok(facility_id.map(str::to_owned))
    }

    /// Facility the removal of an assignment changes
    ///
    /// Unknown assignments count as unscoped so only globally authorized
    /// callers learn they are missing.
    pub async fn removal_target(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<String>, InternalError> {
        let found = self
            .grant_store
            .find_assignment(&self.db, user_id, assignment_id)
            .await?;

        Ok(match found {
            Some((_, role)) if role.is_super_admin() => None,
            Some((assignment, _)) => assignment.facility_id,
            None => None,
        })
    }

    pub async fn assign_role(
        &self,
        ctx: &RequestContext,
        assignment: NewAssignment,
    ) -> Result<user_role::Model, InternalError> {
        let now = self.clock.now_timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;
        let created = self.grant_store.assign_role(&txn, assignment, now).await?;
        let role = self.role_store.get_role(&txn, &created.role_id).await?;
        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        if let Err(e) = self
            .audit_logger
            .log_role_assigned(
                ctx,
                &created.user_id,
                &role.name,
                &created.id,
                created.facility_id.as_deref(),
            )
            .await
        {
            tracing::error!("Failed to log role assignment: {}", e);
        }

        Ok(created)
    }

    pub async fn remove_role(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<(), InternalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;
        let removed = self
            .grant_store
            .remove_assignment(&txn, user_id, assignment_id)
            .await?;
        let role_name = self
            .role_store
            .find_role(&txn, &removed.role_id)
            .await?
            .map(|role| role.name)
            .unwrap_or_else(|| removed.role_id.clone());
        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        if let Err(e) = self
            .audit_logger
            .log_role_removed(
                ctx,
                user_id,
                &role_name,
                &removed.id,
                removed.facility_id.as_deref(),
            )
            .await
        {
            tracing::error!("Failed to log role removal: {}", e);
        }

        Ok(())
    }

    /// Grant a permission directly; the acting user is recorded as `granted_by`
    pub async fn grant_permission(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        permission_id: &str,
    ) -> Result<user_permission::Model, InternalError> {
        let now = self.clock.now_timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;
        let grant = self
            .grant_store
            .grant_permission(&txn, user_id, permission_id, Some(ctx.actor_id.clone()), now)
            .await?;
        let permission = self.role_store.get_permission(&txn, permission_id).await?;
        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        if let Err(e) = self
            .audit_logger
            .log_permission_granted(ctx, user_id, &permission.code)
            .await
        {
            tracing::error!("Failed to log permission grant: {}", e);
        }

        Ok(grant)
    }

    pub async fn revoke_permission(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        permission_id: &str,
    ) -> Result<(), InternalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;
        self.grant_store
            .revoke_permission(&txn, user_id, permission_id)
            .await?;
        let code = self
            .role_store
            .find_permission(&txn, permission_id)
            .await?
            .map(|permission| permission.code)
            .unwrap_or_else(|| permission_id.to_string());
        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        if let Err(e) = self
            .audit_logger
            .log_permission_revoked(ctx, user_id, &code)
            .await
        {
            tracing::error!("Failed to log permission revocation: {}", e);
        }

        Ok(())
    }

    /// Reactivate an account, clearing lockout and the failed counter
    pub async fn activate_user(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<user::Model, InternalError> {
        let updated = self
            .user_store
            .activate(&self.db, user_id, self.clock.now_timestamp())
            .await?;

        tracing::info!("Account {} reactivated by {}", updated.username, ctx.actor_id);
        if let Err(e) = self
            .audit_logger
            .log_account_reactivated(ctx, user_id)
            .await
        {
            tracing::error!("Failed to log account reactivation: {}", e);
        }

        Ok(updated)
    }

    pub async fn deactivate_user(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<user::Model, InternalError> {
        let updated = self
            .user_store
            .deactivate(&self.db, user_id, self.clock.now_timestamp())
            .await?;

        tracing::info!("Account {} deactivated by {}", updated.username, ctx.actor_id);
        if let Err(e) = self
            .audit_logger
            .log_account_deactivated(ctx, user_id)
            .await
        {
            tracing::error!("Failed to log account deactivation: {}", e);
        }

        Ok(updated)
    }

    /// Soft remove an account; the row stays for audit joins
    pub async fn remove_user(&self, ctx: &RequestContext, user_id: &str) -> Result<(), InternalError> {
        self.user_store
            .soft_delete(&self.db, user_id, self.clock.now_timestamp())
            .await?;

        tracing::info!("Account {} removed by {}", user_id, ctx.actor_id);
        if let Err(e) = self
            .audit_logger
            .builder(ACCOUNT_REMOVED)
            .with_context(ctx)
            .add_field("target_user_id", user_id)
            .write()
            .await
        {
            tracing::error!("Failed to log account removal: {}", e);
        }

        Ok(())
    }

    pub async fn grant_role_permission(
        &self,
        ctx: &RequestContext,
        role_id: &str,
        permission_id: &str,
    ) -> Result<role_permission::Model, InternalError> {
        let now = self.clock.now_timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;
        let grant = self
            .role_store
            .grant_permission_to_role(&txn, role_id, permission_id, now)
            .await?;
        let role = self.role_store.get_role(&txn, role_id).await?;
        let permission = self.role_store.get_permission(&txn, permission_id).await?;
        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        if let Err(e) = self
            .audit_logger
            .builder(ROLE_PERMISSION_GRANTED)
            .with_context(ctx)
            .add_field("role", &role.name)
            .add_field("permission", &permission.code)
            .write()
            .await
        {
            tracing::error!("Failed to log role permission grant: {}", e);
        }

        Ok(grant)
    }

    /// Rename a role; system roles are refused
    pub async fn rename_role(
        &self,
        ctx: &RequestContext,
        role_id: &str,
        new_name: &str,
    ) -> Result<role::Model, InternalError> {
        let renamed = self
            .role_store
            .rename_role(&self.db, role_id, new_name, self.clock.now_timestamp())
            .await?;

        tracing::info!("Role {} renamed to {} by {}", role_id, renamed.name, ctx.actor_id);
        Ok(renamed)
    }

    /// Delete a role with its assignments; system roles are refused
    pub async fn delete_role(&self, ctx: &RequestContext, role_id: &str) -> Result<(), InternalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;
        self.role_store.delete_role(&txn, role_id).await?;
        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        tracing::info!("Role {} deleted by {}", role_id, ctx.actor_id);
        Ok(())
    }
}
