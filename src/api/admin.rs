use std::sync::Arc;

use poem::Request;
use poem_openapi::{OpenApi, Tags, param::Path, payload::Json};

use crate::api::auth::BearerAuth;
use crate::api::helpers::{authenticated_context, facility_id, facility_scope, guard_write};
use crate::api::routes;
use crate::app_data::AppData;
use crate::coordinators::AdminCoordinator;
use crate::errors::AdminError;
use crate::providers::{PermissionResolver, TokenProvider};
use crate::stores::NewAssignment;
use crate::types::db::user;
use crate::types::dto::admin::{
    AssignRoleRequest, GrantPermissionRequest, RenameRoleRequest, RoleAssignmentResponse,
    RolePermissionResponse, RoleResponse, UserPermissionResponse, UserStatusResponse,
};
use crate::types::dto::common::MessageResponse;
use crate::types::internal::access::{FacilityScope, RouteAccess};
use crate::types::internal::context::RequestContext;

/// Access administration endpoints
///
/// Every route authenticates the bearer token, then runs the write guard
/// against the facility the write changes before touching the coordinator.
/// Writes with no facility need the permission held globally.
pub struct AdminApi {
    admin_coordinator: Arc<AdminCoordinator>,
    permission_resolver: Arc<PermissionResolver>,
    token_provider: Arc<TokenProvider>,
}

#[derive(Tags)]
enum AdminTags {
    /// User roles, direct permissions and account status
    Users,
    /// Role definitions and role permissions
    Roles,
}

impl AdminApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            admin_coordinator: Arc::new(AdminCoordinator::new(Arc::clone(&app_data))),
            permission_resolver: Arc::clone(&app_data.permission_resolver),
            token_provider: Arc::clone(&app_data.token_provider),
        }
    }

    async fn authorize(
        &self,
        req: &Request,
        auth: &BearerAuth,
        access: RouteAccess,
        scope: &FacilityScope,
        target: Option<&str>,
    ) -> Result<RequestContext, AdminError> {
        let ctx = authenticated_context(req, &auth.0.token, &self.token_provider)
            .map_err(AdminError::from_internal_error)?;
        guard_write(&self.permission_resolver, &ctx, access, scope, target)
            .await
            .map_err(AdminError::from_internal_error)?;
        Ok(ctx)
    }
}

fn status_response(model: user::Model) -> UserStatusResponse {
    UserStatusResponse {
        status: if model.is_active() { "active" } else { "inactive" }.to_string(),
        id: model.id,
        username: model.username,
        failed_login_attempts: model.failed_login_attempts,
        locked_until: model.locked_until,
    }
}

#[OpenApi(prefix_path = "/admin")]
impl AdminApi {
    /// Assign a role to a user, optionally scoped to a facility
    #[oai(path = "/users/:user_id/roles", method = "post", tag = "AdminTags::Users")]
    async fn assign_role(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
        body: Json<AssignRoleRequest>,
    ) -> Result<Json<RoleAssignmentResponse>, AdminError> {
        let facility = facility_id(body.facility_id.as_deref());
        let scope = facility_scope(req, None, facility.as_deref(), None);
        let target = self
            .admin_coordinator
            .assignment_target(&body.role_id, facility.as_deref())
            .await
            .map_err(AdminError::from_internal_error)?;
        let ctx = self
            .authorize(req, &auth, routes::ASSIGN_ROLE, &scope, target.as_deref())
            .await?;

        let body = body.0;
        let created = self
            .admin_coordinator
            .assign_role(
                &ctx,
                NewAssignment {
                    user_id: user_id.0,
                    role_id: body.role_id,
                    facility_id: facility,
                    department_id: body.department_id,
                },
            )
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(RoleAssignmentResponse {
            id: created.id,
            user_id: created.user_id,
            role_id: created.role_id,
            facility_id: created.facility_id,
            department_id: created.department_id,
            created_at: created.created_at,
        }))
    }

    /// Remove one of a user's role assignments
    #[oai(
        path = "/users/:user_id/roles/:assignment_id",
        method = "delete",
        tag = "AdminTags::Users"
    )]
    async fn remove_role(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
        assignment_id: Path<String>,
    ) -> Result<Json<MessageResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let target = self
            .admin_coordinator
            .removal_target(&user_id.0, &assignment_id.0)
            .await
            .map_err(AdminError::from_internal_error)?;
        let ctx = self
            .authorize(req, &auth, routes::REMOVE_ROLE, &scope, target.as_deref())
            .await?;

        self.admin_coordinator
            .remove_role(&ctx, &user_id.0, &assignment_id.0)
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(MessageResponse {
            message: "Role removed".to_string(),
        }))
    }

    /// Grant a permission directly to a user
    #[oai(path = "/users/:user_id/permissions", method = "post", tag = "AdminTags::Users")]
    async fn grant_permission(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
        body: Json<GrantPermissionRequest>,
    ) -> Result<Json<UserPermissionResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let ctx = self
            .authorize(req, &auth, routes::GRANT_PERMISSION, &scope, None)
            .await?;

        let grant = self
            .admin_coordinator
            .grant_permission(&ctx, &user_id.0, &body.permission_id)
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(UserPermissionResponse {
            id: grant.id,
            user_id: grant.user_id,
            permission_id: grant.permission_id,
            granted_by: grant.granted_by,
            granted_at: grant.granted_at,
        }))
    }

    /// Revoke a direct permission grant
    #[oai(
        path = "/users/:user_id/permissions/:permission_id",
        method = "delete",
        tag = "AdminTags::Users"
    )]
    async fn revoke_permission(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
        permission_id: Path<String>,
    ) -> Result<Json<MessageResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let ctx = self
            .authorize(req, &auth, routes::REVOKE_PERMISSION, &scope, None)
            .await?;

        self.admin_coordinator
            .revoke_permission(&ctx, &user_id.0, &permission_id.0)
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(MessageResponse {
            message: "Permission revoked".to_string(),
        }))
    }

    /// Reactivate an account and clear its lockout
    #[oai(path = "/users/:user_id/activate", method = "post", tag = "AdminTags::Users")]
    async fn activate_user(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<UserStatusResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let ctx = self
            .authorize(req, &auth, routes::ACTIVATE_USER, &scope, None)
            .await?;

        let updated = self
            .admin_coordinator
            .activate_user(&ctx, &user_id.0)
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(status_response(updated)))
    }

    /// Deactivate an account; its credentials stop working immediately
    #[oai(path = "/users/:user_id/deactivate", method = "post", tag = "AdminTags::Users")]
    async fn deactivate_user(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<UserStatusResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let ctx = self
            .authorize(req, &auth, routes::DEACTIVATE_USER, &scope, None)
            .await?;

        let updated = self
            .admin_coordinator
            .deactivate_user(&ctx, &user_id.0)
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(status_response(updated)))
    }

    /// Soft remove an account; it can no longer sign in or pass a guard
    #[oai(path = "/users/:user_id", method = "delete", tag = "AdminTags::Users")]
    async fn remove_user(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<MessageResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let ctx = self
            .authorize(req, &auth, routes::REMOVE_USER, &scope, None)
            .await?;

        self.admin_coordinator
            .remove_user(&ctx, &user_id.0)
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(MessageResponse {
            message: "User removed".to_string(),
        }))
    }

    /// Grant a permission to a role
    #[oai(path = "/roles/:role_id/permissions", method = "post", tag = "AdminTags::Roles")]
    async fn grant_role_permission(
        &self,
        req: &Request,
        auth: BearerAuth,
        role_id: Path<String>,
        body: Json<GrantPermissionRequest>,
    ) -> Result<Json<RolePermissionResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let ctx = self
            .authorize(req, &auth, routes::GRANT_ROLE_PERMISSION, &scope, None)
            .await?;

        let grant = self
            .admin_coordinator
            .grant_role_permission(&ctx, &role_id.0, &body.permission_id)
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(RolePermissionResponse {
            id: grant.id,
            role_id: grant.role_id,
            permission_id: grant.permission_id,
        }))
    }

    /// Rename a role
    #[oai(path = "/roles/:role_id", method = "put", tag = "AdminTags::Roles")]
    async fn rename_role(
        &self,
        req: &Request,
        auth: BearerAuth,
        role_id: Path<String>,
        body: Json<RenameRoleRequest>,
    ) -> Result<Json<RoleResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let ctx = self
            .authorize(req, &auth, routes::RENAME_ROLE, &scope, None)
            .await?;

        let renamed = self
            .admin_coordinator
            .rename_role(&ctx, &role_id.0, body.name.trim())
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(RoleResponse {
            id: renamed.id,
            name: renamed.name,
            description: renamed.description,
            is_system_role: renamed.is_system_role,
        }))
    }

    /// Delete a role; its assignments go with it
    #[oai(path = "/roles/:role_id", method = "delete", tag = "AdminTags::Roles")]
    async fn delete_role(
        &self,
        req: &Request,
        auth: BearerAuth,
        role_id: Path<String>,
    ) -> Result<Json<MessageResponse>, AdminError> {
        let scope = facility_scope(req, None, None, None);
        let ctx = self
            .authorize(req, &auth, routes::DELETE_ROLE, &scope, None)
            .await?;

        self.admin_coordinator
            .delete_role(&ctx, &role_id.0)
            .await
            .map_err(AdminError::from_internal_error)?;

        Ok(Json(MessageResponse {
            message: "Role deleted".to_string(),
        }))
    }
}
