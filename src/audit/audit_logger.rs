use std::sync::Arc;

use serde_json::json;

use crate::audit::AuditBuilder;
use crate::errors::InternalError;
use crate::stores::AuditStore;
use crate::types::internal::access::DenyReason;
use crate::types::internal::audit::{AuditEvent, EventType};
use crate::types::internal::context::RequestContext;

/// Writes the security events of the auth core
///
/// Every method returns the store result; callers log a failure with
/// `tracing::error!` and carry on, an audit outage never blocks a request.
pub struct AuditLogger {
    pub audit_store: Arc<AuditStore>,
}

impl AuditLogger {
    pub fn new(audit_store: Arc<AuditStore>) -> Self {
        Self { audit_store }
    }

    /// Builder for event types without a dedicated method
    pub fn builder(&self, event_type: impl Into<EventType>) -> AuditBuilder {
        AuditBuilder::new(Arc::clone(&self.audit_store), event_type)
    }

    /// Super admin skipped a permission check
    ///
    /// Written before the request proceeds, once per authorization call.
    pub async fn log_super_admin_bypass(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        bypassed: &[String],
        facility_id: Option<&str>,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::SuperAdminPermissionBypass);
        event.data.insert("user_id".to_string(), json!(user_id));
        event.data.insert("bypassed".to_string(), json!(bypassed));
        event.data.insert("facility_id".to_string(), json!(facility_id));

        self.audit_store.write_event(event).await
    }

    /// Authorization check refused access
    ///
    /// `requested` holds permission codes or role names, whichever the check was about.
    pub async fn log_access_denied(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        requested: &[String],
        missing: &[String],
        reason: DenyReason,
        facility_id: Option<&str>,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::AccessDenied);
        event.data.insert("user_id".to_string(), json!(user_id));
        event.data.insert("requested".to_string(), json!(requested));
        event.data.insert("missing".to_string(), json!(missing));
        event.data.insert("reason".to_string(), json!(reason.as_str()));
        event.data.insert("facility_id".to_string(), json!(facility_id));

        self.audit_store.write_event(event).await
    }

    /// A client key crossed the login attempt threshold
    pub async fn log_rate_limit_block(
        &self,
        ctx: &RequestContext,
        client_key: &str,
        block_seconds: i64,
        attempts: u32,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::RateLimitBlock);
        event.ip_address = Some(client_key.to_string());
        event.data.insert("client_key".to_string(), json!(client_key));
        event
            .data
            .insert("block_duration_seconds".to_string(), json!(block_seconds));
        event.data.insert("attempts".to_string(), json!(attempts));

        self.audit_store.write_event(event).await
    }

    /// An account moved into the locked state
    pub async fn log_account_locked(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        username: &str,
        failed_attempts: i32,
        locked_until: Option<i64>,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::AccountLocked);
        event.data.insert("user_id".to_string(), json!(user_id));
        event.data.insert("username".to_string(), json!(username));
        event
            .data
            .insert("failed_attempts".to_string(), json!(failed_attempts));
        event
            .data
            .insert("locked_until".to_string(), json!(locked_until));

        self.audit_store.write_event(event).await
    }

    pub async fn log_login_success(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        username: &str,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::LoginSuccess);
        event.actor_id = Some(user_id.to_string());
        event.data.insert("user_id".to_string(), json!(user_id));
        event.data.insert("username".to_string(), json!(username));

        self.audit_store.write_event(event).await
    }

    /// `user_id` is `None` when the identifier matched no account
    pub async fn log_login_failure(
        &self,
        ctx: &RequestContext,
        user_id: Option<&str>,
        username: &str,
        reason: &str,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::LoginFailure);
        event.actor_id = user_id.map(str::to_owned);
        event.data.insert("username".to_string(), json!(username));
        event.data.insert("reason".to_string(), json!(reason));

        self.audit_store.write_event(event).await
    }

    pub async fn log_password_changed(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::PasswordChanged);
        event.data.insert("user_id".to_string(), json!(user_id));

        self.audit_store.write_event(event).await
    }

    pub async fn log_role_assigned(
        &self,
        ctx: &RequestContext,
        target_user_id: &str,
        role_name: &str,
        assignment_id: &str,
        facility_id: Option<&str>,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::RoleAssigned);
        event
            .data
            .insert("target_user_id".to_string(), json!(target_user_id));
        event.data.insert("role".to_string(), json!(role_name));
        event
            .data
            .insert("assignment_id".to_string(), json!(assignment_id));
        event.data.insert("facility_id".to_string(), json!(facility_id));

        self.audit_store.write_event(event).await
    }

    pub async fn log_role_removed(
        &self,
        ctx: &RequestContext,
        target_user_id: &str,
        role_name: &str,
        assignment_id: &str,
        facility_id: Option<&str>,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::RoleRemoved);
        event
            .data
            .insert("target_user_id".to_string(), json!(target_user_id));
        event.data.insert("role".to_string(), json!(role_name));
        event
            .data
            .insert("assignment_id".to_string(), json!(assignment_id));
        event.data.insert("facility_id".to_string(), json!(facility_id));

        self.audit_store.write_event(event).await
    }

    pub async fn log_permission_granted(
        &self,
        ctx: &RequestContext,
        target_user_id: &str,
        permission_code: &str,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::PermissionGranted);
        event
            .data
            .insert("target_user_id".to_string(), json!(target_user_id));
        event
            .data
            .insert("permission".to_string(), json!(permission_code));

        self.audit_store.write_event(event).await
    }

    pub async fn log_permission_revoked(
        &self,
        ctx: &RequestContext,
        target_user_id: &str,
        permission_code: &str,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::PermissionRevoked);
        event
            .data
            .insert("target_user_id".to_string(), json!(target_user_id));
        event
            .data
            .insert("permission".to_string(), json!(permission_code));

        self.audit_store.write_event(event).await
    }

    /// Reactivation also clears lockout and the failed counter
    pub async fn log_account_reactivated(
        &self,
        ctx: &RequestContext,
        target_user_id: &str,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::AccountReactivated);
        event
            .data
            .insert("target_user_id".to_string(), json!(target_user_id));

        self.audit_store.write_event(event).await
    }

    pub async fn log_account_deactivated(
        &self,
        ctx: &RequestContext,
        target_user_id: &str,
    ) -> Result<(), InternalError> {
        let mut event = base_event(ctx, EventType::AccountDeactivated);
        event
            .data
            .insert("target_user_id".to_string(), json!(target_user_id));

        self.audit_store.write_event(event).await
    }
}

/// Actor, client address, JWT id and request fields common to every event
fn base_event(ctx: &RequestContext, event_type: EventType) -> AuditEvent {
    let mut event = AuditEvent::new(event_type);
    event.actor_id = Some(ctx.actor_id.clone());
    event.ip_address = Some(ctx.client_key());
    event.jwt_id = ctx.claims.as_ref().map(|claims| claims.jti.clone());

    event
        .data
        .insert("request_id".to_string(), json!(ctx.request_id.to_string()));
    event
        .data
        .insert("source".to_string(), json!(ctx.source.to_string()));
    if let Some(username) = ctx.username() {
        event
            .data
            .insert("actor_username".to_string(), json!(username));
    }
    if let Some(method) = &ctx.method {
        event.data.insert("method".to_string(), json!(method));
    }
    if let Some(path) = &ctx.path {
        event.data.insert("path".to_string(), json!(path));
    }

    event
}
