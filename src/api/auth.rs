use std::sync::Arc;

use chrono::DateTime;
use poem::Request;
use poem_openapi::{OpenApi, SecurityScheme, Tags, auth::Bearer, param::Query, payload::Json};

use crate::api::helpers::{authenticated_context, facility_id, facility_scope, guard, guard_write};
use crate::api::routes;
use crate::app_data::AppData;
use crate::coordinators::AuthCoordinator;
use crate::errors::AuthError;
use crate::providers::{PermissionResolver, TokenProvider};
use crate::stores::NewPasswordPolicy;
use crate::types::db::password_policy;
use crate::types::dto::auth::{
    ChangePasswordRequest, CreatePasswordPolicyRequest, LoginRequest, LoginResponse, LoginUser,
    PasswordPolicyResponse, ProfileResponse, ProfileRole, RefreshRequest,
};
use crate::types::dto::common::MessageResponse;
use crate::types::internal::auth::AuthSession;
use crate::types::internal::context::RequestContext;

/// Bearer token authentication for protected endpoints
#[derive(SecurityScheme)]
#[oai(
    ty = "bearer",
    key_name = "Authorization",
    key_in = "header",
    bearer_format = "JWT"
)]
pub struct BearerAuth(pub Bearer);

/// Authentication API endpoints
pub struct AuthApi {
    auth_coordinator: Arc<AuthCoordinator>,
    permission_resolver: Arc<PermissionResolver>,
    token_provider: Arc<TokenProvider>,
}

#[derive(Tags)]
enum AuthTags {
    /// Login, tokens and password management
    Authentication,
    /// Password policy administration
    PasswordPolicy,
}

impl AuthApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        let auth_coordinator = Arc::new(AuthCoordinator::new(Arc::clone(&app_data)));
        Self {
            token_provider: auth_coordinator.token_provider(),
            auth_coordinator,
            permission_resolver: Arc::clone(&app_data.permission_resolver),
        }
    }

    fn context(&self, req: &Request, auth: &BearerAuth) -> Result<RequestContext, AuthError> {
        authenticated_context(req, &auth.0.token, &self.token_provider)
            .map_err(AuthError::from_internal_error)
    }
}

fn login_response(session: AuthSession) -> LoginResponse {
    LoginResponse {
        access_token: session.tokens.access_token,
        refresh_token: session.tokens.refresh_token,
        expires_in: session.tokens.expires_in,
        user: LoginUser {
            id: session.user.id,
            username: session.user.username,
            full_name: session.user.full_name,
            email: session.user.email,
            roles: session.roles,
            permissions: session.permissions,
        },
    }
}

fn policy_response(model: password_policy::Model) -> PasswordPolicyResponse {
    let common_passwords_blacklist = model
        .common_passwords_blacklist
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
        .unwrap_or_default();

    PasswordPolicyResponse {
        id: model.id,
        name: model.name,
        facility_id: model.facility_id,
        min_length: model.min_length,
        max_length: model.max_length,
        require_uppercase: model.require_uppercase,
        require_lowercase: model.require_lowercase,
        require_numbers: model.require_numbers,
        require_special_chars: model.require_special_chars,
        allowed_special_chars: model.allowed_special_chars,
        password_history_count: model.password_history_count,
        max_failed_attempts: model.max_failed_attempts,
        lockout_duration_minutes: model.lockout_duration_minutes,
        min_age_days: model.min_age_days,
        common_passwords_blacklist,
        is_default: model.is_default,
        is_active: model.is_active,
    }
}

/// Fill omitted fields with the column defaults
fn new_policy(body: CreatePasswordPolicyRequest) -> Result<NewPasswordPolicy, AuthError> {
    let common_passwords_blacklist = match body.common_passwords_blacklist {
        Some(list) => Some(serde_json::to_string(&list).map_err(|e| {
            tracing::error!("Failed to encode password blacklist: {}", e);
            AuthError::password_validation_failed("Invalid common password blacklist")
        })?),
        None => None,
    };

    Ok(NewPasswordPolicy {
        name: body.name,
        facility_id: facility_id(body.facility_id.as_deref()),
        min_length: body.min_length.unwrap_or(8),
        max_length: body.max_length.unwrap_or(128),
        require_uppercase: body.require_uppercase.unwrap_or(true),
        require_lowercase: body.require_lowercase.unwrap_or(true),
        require_numbers: body.require_numbers.unwrap_or(true),
        require_special_chars: body.require_special_chars.unwrap_or(true),
        allowed_special_chars: body.allowed_special_chars,
        password_history_count: body.password_history_count.unwrap_or(5),
        max_failed_attempts: body.max_failed_attempts.unwrap_or(5),
        lockout_duration_minutes: body.lockout_duration_minutes.unwrap_or(15),
        min_age_days: body.min_age_days.unwrap_or(0),
        common_passwords_blacklist,
        is_default: body.is_default.unwrap_or(false),
    })
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Authenticate with username (or email) and password
    ///
    /// Returns an access/refresh token pair and the caller's roles and permissions.
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(
        &self,
        req: &Request,
        body: Json<LoginRequest>,
    ) -> Result<Json<LoginResponse>, AuthError> {
        let ctx = RequestContext::from_request(req);

        let session = self
            .auth_coordinator
            .login(
                &ctx,
                body.username.trim(),
                &body.password,
                body.mfa_code.as_deref(),
            )
            .await
            .map_err(AuthError::from_internal_error)?;

        Ok(Json(login_response(session)))
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// Roles are re-read from storage, so changes since login take effect.
    #[oai(path = "/refresh", method = "post", tag = "AuthTags::Authentication")]
    async fn refresh(&self, body: Json<RefreshRequest>) -> Result<Json<LoginResponse>, AuthError> {
        let session = self
            .auth_coordinator
            .refresh(&body.refresh_token)
            .await
            .map_err(AuthError::from_refresh_error)?;

        Ok(Json(login_response(session)))
    }

    /// Change the caller's password
    #[oai(path = "/change-password", method = "post", tag = "AuthTags::Authentication")]
    async fn change_password(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<ChangePasswordRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let ctx = self.context(req, &auth)?;

        self.auth_coordinator
            .change_password(&ctx, &ctx.actor_id, &body.current_password, &body.new_password)
            .await
            .map_err(AuthError::from_internal_error)?;

        Ok(Json(MessageResponse {
            message: "Password changed successfully".to_string(),
        }))
    }

    /// The caller's account and role assignments
    #[oai(path = "/profile", method = "get", tag = "AuthTags::Authentication")]
    async fn profile(
        &self,
        req: &Request,
        auth: BearerAuth,
    ) -> Result<Json<ProfileResponse>, AuthError> {
        let ctx = self.context(req, &auth)?;

        let (user, roles) = self
            .auth_coordinator
            .profile(&ctx.actor_id)
            .await
            .map_err(AuthError::from_internal_error)?;

        Ok(Json(ProfileResponse {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            mfa_enabled: user.mfa_enabled,
            last_login_at: user
                .last_login_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.to_rfc3339()),
            roles: roles
                .into_iter()
                .map(|held| ProfileRole {
                    role: held.role,
                    facility: held.facility,
                })
                .collect(),
        }))
    }

    /// Active password policies, optionally narrowed to a facility
    #[oai(path = "/password-policies", method = "get", tag = "AuthTags::PasswordPolicy")]
    async fn list_password_policies(
        &self,
        req: &Request,
        auth: BearerAuth,
        #[oai(name = "facilityId")] facility_id: Query<Option<String>>,
    ) -> Result<Json<Vec<PasswordPolicyResponse>>, AuthError> {
        let ctx = self.context(req, &auth)?;
        let scope = facility_scope(req, facility_id.0.as_deref(), None, None);
        guard(
            &self.permission_resolver,
            &ctx,
            routes::LIST_PASSWORD_POLICIES,
            &scope,
        )
        .await
        .map_err(AuthError::from_internal_error)?;

        let policies = self
            .auth_coordinator
            .list_policies(scope.resolve().as_deref())
            .await
            .map_err(AuthError::from_internal_error)?;

        Ok(Json(policies.into_iter().map(policy_response).collect()))
    }

    /// Create a password policy
    ///
    /// A policy created as default replaces the previous default.
    #[oai(path = "/password-policies", method = "post", tag = "AuthTags::PasswordPolicy")]
    async fn create_password_policy(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<CreatePasswordPolicyRequest>,
    ) -> Result<Json<PasswordPolicyResponse>, AuthError> {
        let ctx = self.context(req, &auth)?;
        let target = facility_id(body.facility_id.as_deref());
        let scope = facility_scope(req, None, target.as_deref(), None);
        guard_write(
            &self.permission_resolver,
            &ctx,
            routes::CREATE_PASSWORD_POLICY,
            &scope,
            target.as_deref(),
        )
        .await
        .map_err(AuthError::from_internal_error)?;

        let created = self
            .auth_coordinator
            .create_policy(new_policy(body.0)?)
            .await
            .map_err(AuthError::from_internal_error)?;

        Ok(Json(policy_response(created)))
    }
}
