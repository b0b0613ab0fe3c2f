use std::sync::Arc;

use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::audit::AuditLogger;
use crate::config::LockoutSettings;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::providers::clock::Clock;
use crate::providers::crypto_provider::{CryptoProvider, PasswordVerification};
use crate::providers::password_policy_provider::PasswordPolicyProvider;
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::internal::context::RequestContext;

/// Credential validator with failed-attempt lockout
///
/// Per account: `Normal -> Locked` when the failed counter reaches the threshold;
/// `Locked -> Normal` when the lock expires (the next success resets the counter)
/// or on admin reactivation. While locked no hash comparison happens.
pub struct CredentialProvider {
    db: DatabaseConnection,
    user_store: Arc<UserStore>,
    policy_provider: Arc<PasswordPolicyProvider>,
    crypto: Arc<CryptoProvider>,
    audit_logger: Arc<AuditLogger>,
    clock: Arc<dyn Clock>,
    lockout_defaults: LockoutSettings,
}

impl CredentialProvider {
    pub fn new(
        db: DatabaseConnection,
        user_store: Arc<UserStore>,
        policy_provider: Arc<PasswordPolicyProvider>,
        crypto: Arc<CryptoProvider>,
        audit_logger: Arc<AuditLogger>,
        clock: Arc<dyn Clock>,
        lockout_defaults: LockoutSettings,
    ) -> Self {
        Self {
            db,
            user_store,
            policy_provider,
            crypto,
            audit_logger,
            clock,
            lockout_defaults,
        }
    }

    /// Verify a username-or-email and password pair
    ///
    /// # Errors
    /// * `CredentialError::InvalidCredentials` - unknown identifier or wrong password
    /// * `CredentialError::AccountLocked` - lock still running; nothing was compared or counted
    /// * `CredentialError::DataIntegrityFault` - stored hash missing or unparseable
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        identifier: &str,
        password: &str,
    ) -> Result<user::Model, InternalError> {
        let Some(user) = self
            .user_store
            .find_by_identifier(&self.db, identifier)
            .await?
        else {
            return Err(CredentialError::InvalidCredentials.into());
        };

        let now = self.clock.now_timestamp();
        if let Some(locked_until) = user.locked_until {
            if locked_until > now {
                return Err(CredentialError::AccountLocked {
                    remaining_seconds: locked_until - now,
                }
                .into());
            }
        }

        match self.compare(&user, password).await? {
            PasswordVerification::Match => {
                if user.failed_login_attempts != 0 || user.locked_until.is_some() {
                    self.user_store
                        .reset_failed_attempts(&self.db, &user.id, now)
                        .await?;
                }
                Ok(user)
            }
            PasswordVerification::Mismatch => {
                self.record_failure(ctx, &user, now).await?;
                Err(CredentialError::InvalidCredentials.into())
            }
            PasswordVerification::Malformed(reason) => Err(self.integrity_fault(&user.id, reason)),
        }
    }

    /// Check a user's current password without touching lockout state
    pub async fn verify_current_password(
        &self,
        user: &user::Model,
        password: &str,
    ) -> Result<(), InternalError> {
        match self.compare(user, password).await? {
            PasswordVerification::Match => Ok(()),
            PasswordVerification::Mismatch => Err(CredentialError::IncorrectPassword.into()),
            PasswordVerification::Malformed(reason) => Err(self.integrity_fault(&user.id, reason)),
        }
    }

    async fn compare(
        &self,
        user: &user::Model,
        password: &str,
    ) -> Result<PasswordVerification, InternalError> {
        match user.password_hash.as_deref() {
            Some(hash) if !hash.is_empty() => self.crypto.verify_password(password, hash).await,
            _ => Ok(PasswordVerification::Malformed(
                "password hash is missing".to_string(),
            )),
        }
    }

    async fn record_failure(
        &self,
        ctx: &RequestContext,
        user: &user::Model,
        now: i64,
    ) -> Result<(), InternalError> {
        let lockout = self
            .policy_provider
            .lockout_settings(self.lockout_defaults)
            .await?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(InternalError::transaction_begin)?;
        let outcome = self
            .user_store
            .record_failed_attempt(
                &txn,
                &user.id,
                lockout.threshold,
                now + lockout.duration_seconds,
                now,
            )
            .await?;
        txn.commit()
            .await
            .map_err(InternalError::transaction_commit)?;

        if outcome.newly_locked {
            tracing::warn!(
                "Account {} locked after {} failed attempts",
                user.username,
                outcome.failed_attempts
            );
            if let Err(e) = self
                .audit_logger
                .log_account_locked(
                    ctx,
                    &user.id,
                    &user.username,
                    outcome.failed_attempts,
                    outcome.locked_until,
                )
                .await
            {
                tracing::error!("Failed to log account lockout: {}", e);
            }
        }

        Ok(())
    }

    fn integrity_fault(&self, user_id: &str, reason: String) -> InternalError {
        tracing::error!(
            "Credential data integrity fault for user {}: {}",
            user_id,
            reason
        );
        CredentialError::data_integrity(user_id, reason).into()
    }
}
