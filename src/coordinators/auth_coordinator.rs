use std::sync::Arc;

use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::app_data::AppData;
use crate::audit::AuditLogger;
use crate::errors::InternalError;
use crate::errors::internal::{
    CredentialError, DatabaseError, JwtValidationError, RateLimitError,
};
use crate::providers::{
    Clock, CredentialProvider, CryptoProvider, LoginRateLimiter, PasswordPolicyProvider,
    PermissionResolver, TokenProvider,
};
use crate::stores::{
    FacilityStore, GrantStore, NewPasswordPolicy, PasswordHistoryStore, UserStore,
};
use crate::types::db::{password_policy, user};
use crate::types::internal::auth::{AuthSession, HeldRole, TokenIdentity};
use crate::types::internal::context::RequestContext;
use crate::types::internal::rate_limit::RateLimitDecision;

/// Orchestrates the login, refresh, password change, profile and policy workflows
pub struct AuthCoordinator {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    user_store: Arc<UserStore>,
    grant_store: Arc<GrantStore>,
    facility_store: Arc<FacilityStore>,
    history_store: Arc<PasswordHistoryStore>,
    crypto: Arc<CryptoProvider>,
    rate_limiter: Arc<LoginRateLimiter>,
    credential_provider: Arc<CredentialProvider>,
    policy_provider: Arc<PasswordPolicyProvider>,
    permission_resolver: Arc<PermissionResolver>,
    token_provider: Arc<TokenProvider>,
    audit_logger: Arc<AuditLogger>,
}

impl AuthCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.connections.auth.clone(),
            clock: Arc::clone(&app_data.clock),
            user_store: Arc::clone(&app_data.user_store),
            grant_store: Arc::clone(&app_data.grant_store),
            facility_store: Arc::clone(&app_data.facility_store),
            history_store: Arc::clone(&app_data.history_store),
            crypto: Arc::clone(&app_data.crypto),
            rate_limiter: Arc::clone(&app_data.rate_limiter),
            credential_provider: Arc::clone(&app_data.credential_provider),
            policy_provider: Arc::clone(&app_data.policy_provider),
            permission_resolver: Arc::clone(&app_data.permission_resolver),
            token_provider: Arc::clone(&app_data.token_provider),
            audit_logger: Arc::clone(&app_data.audit_logger),
        }
    }

    pub fn token_provider(&self) -> Arc<TokenProvider> {
        Arc::clone(&self.token_provider)
    }

    /// Login pipeline
    ///
    /// 1. Rate limiter on the client key
    /// 2. Credential validation (lockout inside)
    /// 3. Account status gate, then MFA flag
    /// 4. Last-login stamp, rate limit reset, token pair
    pub async fn login(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
        mfa_code: Option<&str>,
    ) -> Result<AuthSession, InternalError> {
        if let RateLimitDecision::Blocked {
            retry_after_seconds,
        } = self.rate_limiter.check(ctx).await
        {
            self.log_login_failure(ctx, None, username, "rate_limited")
                .await;
            return Err(RateLimitError::Blocked {
                retry_after_seconds,
            }
            .into());
        }

        let user = match self
            .credential_provider
            .authenticate(ctx, username, password)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                let reason = match &e {
                    InternalError::Credential(CredentialError::InvalidCredentials) => {
                        "invalid_credentials"
                    }
                    InternalError::Credential(CredentialError::AccountLocked { .. }) => {
                        "account_locked"
                    }
                    _ => "internal_error",
                };
                self.log_login_failure(ctx, None, username, reason).await;
                return Err(e);
            }
        };

        if !user.is_active() {
            self.log_login_failure(ctx, Some(&user.id), username, "account_inactive")
                .await;
            return Err(CredentialError::AccountInactive.into());
        }

        if user.mfa_enabled && mfa_code.is_none_or(|code| code.trim().is_empty()) {
            return Err(CredentialError::MfaRequired.into());
        }

        let now = self.clock.now_timestamp();
        self.user_store.record_login(&self.db, &user.id, now).await?;
        self.rate_limiter.reset(&ctx.client_key()).await;

        let session = self.open_session(user).await?;

        if let Err(e) = self
            .audit_logger
            .log_login_success(ctx, &session.user.id, &session.user.username)
            .await
        {
            tracing::error!("Failed to log login success: {}", e);
        }

        Ok(session)
    }

    /// Exchange a refresh token for a new pair built from current stored roles
    ///
    /// Every failure is reported as a token validation error.
    pub async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<AuthSession, InternalError> {
        let claims = self.token_provider.verify_refresh(refresh_token)?;

        let user = self
            .user_store
            .find_by_id(&self.db, &claims.sub)
            .await?
            .ok_or_else(|| JwtValidationError::subject_rejected("user not found"))?;

        if !user.is_active() {
            return Err(JwtValidationError::subject_rejected("user inactive").into());
        }

        self.open_session(user).await
    }

    /// Change the caller's password
    ///
    /// Order: current password, minimum age, policy, reuse, hash. The history
    /// append and the hash swap share one transaction; the swap only applies
    /// if the stored hash is still the one verified, so a concurrent change
    /// rolls this one back.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), InternalError> {
        let user = self.user_store.get_by_id(&self.db, user_id).await?;
        self.credential_provider
            .verify_current_password(&user, current_password)
            .await?;
        let old_hash = user
            .password_hash
            .clone()
            .ok_or_else(|| CredentialError::data_integrity(user_id, "password hash is missing"))?;

        let facility_id = ctx
            .claims
            .as_ref()
            .and_then(|claims| claims.facility_id.as_deref());
        let policy = self.policy_provider.resolve(facility_id).await?;

        self.policy_provider
            .check_min_age(&policy, user.password_changed_at)?;
        self.policy_provider
            .validate(new_password, Some(user_id), facility_id)
            .await?;
        self.policy_provider
            .check_reuse_with(&policy, user_id, new_password)
            .await?;

        let new_hash = self.crypto.hash_password(new_password).await?;
        let now = self.clock.now_timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;
        self.history_store
            .append(&txn, user_id, &old_hash, now)
            .await?;
        let replaced = self
            .user_store
            .replace_password_hash(&txn, user_id, &old_hash, &new_hash, now)
            .await?;
        if !replaced {
            txn.rollback()
                .await
                .map_err(|e| InternalError::database("rollback_password_change", e))?;
            return Err(DatabaseError::ConcurrentModification {
                operation: "change_password".to_string(),
            }
            .into());
        }
        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        tracing::info!("Password changed for user {}", user.username);
        if let Err(e) = self.audit_logger.log_password_changed(ctx, user_id).await {
            tracing::error!("Failed to log password change: {}", e);
        }

        Ok(())
    }

    /// The caller's account with every role they hold
    pub async fn profile(
        &self,
        user_id: &str,
    ) -> Result<(user::Model, Vec<HeldRole>), InternalError> {
        let user = self.user_store.get_by_id(&self.db, user_id).await?;
        let assignments = self
            .grant_store
            .assignments_with_roles(&self.db, user_id)
            .await?;

        let mut roles = Vec::with_capacity(assignments.len());
        for (assignment, role) in assignments {
            let facility = match assignment.facility_id.as_deref() {
                Some(facility_id) => self
                    .facility_store
                    .find_by_id(&self.db, facility_id)
                    .await?
                    .map(|facility| facility.name),
                None => None,
            };
            roles.push(HeldRole {
                role: role.name,
                facility,
            });
        }

        Ok((user, roles))
    }

    pub async fn create_policy(
        &self,
        policy: NewPasswordPolicy,
    ) -> Result<password_policy::Model, InternalError> {
        let created = self.policy_provider.create_policy(policy).await?;
        tracing::info!("Password policy {} created", created.name);
        Ok(created)
    }

    pub async fn list_policies(
        &self,
        facility_id: Option<&str>,
    ) -> Result<Vec<password_policy::Model>, InternalError> {
        self.policy_provider.list_policies(facility_id).await
    }

    async fn open_session(&self, user: user::Model) -> Result<AuthSession, InternalError> {
        let snapshot = self.permission_resolver.role_snapshot(&user.id).await?;
        let permissions = self
            .permission_resolver
            .effective_permissions(&user.id, None)
            .await?;

        let tokens = self.token_provider.issue(&TokenIdentity {
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: snapshot.roles.clone(),
            facility_id: snapshot.facility_id,
        })?;

        Ok(AuthSession {
            tokens,
            user,
            roles: snapshot.roles,
            permissions: permissions.into_iter().collect(),
        })
    }

    async fn log_login_failure(
        &self,
        ctx: &RequestContext,
        user_id: Option<&str>,
        username: &str,
        reason: &str,
    ) {
        if let Err(e) = self
            .audit_logger
            .log_login_failure(ctx, user_id, username, reason)
            .await
        {
            tracing::error!("Failed to log login failure: {}", e);
        }
    }
}
