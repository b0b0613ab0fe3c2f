use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::types::db::user::{self, UserStatus};

/// Fields for a new user account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

/// State after a failed password comparison was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedAttemptOutcome {
    pub failed_attempts: i32,
    /// True only when this attempt moved the account into the locked state
    pub newly_locked: bool,
    pub locked_until: Option<i64>,
}

/// Repository for user accounts
///
/// Stateless; every method takes the connection or transaction to run on.
#[derive(Debug, Default)]
pub struct UserStore;

impl UserStore {
    pub fn new() -> Self {
        Self
    }

    /// Look up a login identifier against username OR email; soft-deleted users are invisible
    pub async fn find_by_identifier(
        &self,
        conn: &impl ConnectionTrait,
        identifier: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier))
                    .add(user::Column::Email.eq(identifier)),
            )
            .filter(user::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_identifier", e))
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find_by_id(user_id.to_owned())
            .filter(user::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))
    }

    /// Like `find_by_id`, but a missing user is an error
    pub async fn get_by_id(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<user::Model, InternalError> {
        self.find_by_id(conn, user_id)
            .await?
            .ok_or_else(|| {
                CredentialError::UserIdNotFound {
                    user_id: user_id.to_string(),
                }
                .into()
            })
    }

    pub async fn create_user(
        &self,
        conn: &impl ConnectionTrait,
        new_user: NewUser,
        now: i64,
    ) -> Result<user::Model, InternalError> {
        let clash = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(new_user.username.as_str()))
                    .add(user::Column::Email.eq(new_user.email.as_str())),
            )
            .one(conn)
            .await
            .map_err(|e| InternalError::database("check_duplicate_user", e))?;

        if let Some(existing) = clash {
            if existing.username == new_user.username {
                return Err(CredentialError::DuplicateUsername(new_user.username).into());
            }
            return Err(CredentialError::DuplicateEmail(new_user.email).into());
        }

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            username: Set(new_user.username),
            email: Set(new_user.email),
            full_name: Set(new_user.full_name),
            phone: Set(new_user.phone),
            password_hash: Set(Some(new_user.password_hash)),
            status: Set(UserStatus::Active),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            mfa_enabled: Set(false),
            last_login_at: Set(None),
            password_changed_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("create_user", e))
    }

    /// Count a failed attempt and lock the account once `threshold` is reached
    ///
    /// Both writes are conditional updates evaluated by the database, so concurrent
    /// failures cannot lose increments. Run inside a transaction.
    pub async fn record_failed_attempt(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        threshold: i32,
        lock_until: i64,
        now: i64,
    ) -> Result<FailedAttemptOutcome, InternalError> {
        let incremented = user::Entity::update_many()
            .col_expr(
                user::Column::FailedLoginAttempts,
                Expr::col(user::Column::FailedLoginAttempts).add(1),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("increment_failed_attempts", e))?;

        if incremented.rows_affected == 0 {
            return Err(CredentialError::UserIdNotFound {
                user_id: user_id.to_string(),
            }
            .into());
        }

        // Only an account that is not currently locked transitions
        let locked = user::Entity::update_many()
            .col_expr(user::Column::LockedUntil, Expr::value(lock_until))
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::FailedLoginAttempts.gte(threshold))
            .filter(
                Condition::any()
                    .add(user::Column::LockedUntil.is_null())
                    .add(user::Column::LockedUntil.lte(now)),
            )
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("lock_account", e))?;

        let current = self.get_by_id(conn, user_id).await?;

        Ok(FailedAttemptOutcome {
            failed_attempts: current.failed_login_attempts,
            newly_locked: locked.rows_affected == 1,
            locked_until: current.locked_until,
        })
    }

    /// Clear the failed counter and any lockout
    pub async fn reset_failed_attempts(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        now: i64,
    ) -> Result<(), InternalError> {
        user::Entity::update_many()
            .col_expr(user::Column::FailedLoginAttempts, Expr::value(0))
            .col_expr(user::Column::LockedUntil, Expr::value(Option::<i64>::None))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("reset_failed_attempts", e))?;

        Ok(())
    }

    pub async fn record_login(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        now: i64,
    ) -> Result<(), InternalError> {
        user::Entity::update_many()
            .col_expr(user::Column::LastLoginAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("record_login", e))?;

        Ok(())
    }

    /// Swap the password hash only if it still equals `expected_hash`
    ///
    /// Returns false when another change won the race.
    pub async fn replace_password_hash(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        expected_hash: &str,
        new_hash: &str,
        now: i64,
    ) -> Result<bool, InternalError> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(new_hash))
            .col_expr(user::Column::PasswordChangedAt, Expr::value(now))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::PasswordHash.eq(expected_hash))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("replace_password_hash", e))?;

        Ok(result.rows_affected == 1)
    }

    /// Reactivate an account; also clears lockout and the failed counter
    pub async fn activate(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        now: i64,
    ) -> Result<user::Model, InternalError> {
        let mut model: user::ActiveModel = self.get_by_id(conn, user_id).await?.into();
        model.status = Set(UserStatus::Active);
        model.failed_login_attempts = Set(0);
        model.locked_until = Set(None);
        model.updated_at = Set(now);

        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("activate_user", e))
    }

    pub async fn deactivate(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        now: i64,
    ) -> Result<user::Model, InternalError> {
        let mut model: user::ActiveModel = self.get_by_id(conn, user_id).await?.into();
        model.status = Set(UserStatus::Inactive);
        model.updated_at = Set(now);

        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("deactivate_user", e))
    }

    pub async fn set_mfa_enabled(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        enabled: bool,
        now: i64,
    ) -> Result<(), InternalError> {
        user::Entity::update_many()
            .col_expr(user::Column::MfaEnabled, Expr::value(enabled))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("set_mfa_enabled", e))?;

        Ok(())
    }

    /// Soft remove; the row stays for audit joins
    pub async fn soft_delete(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        now: i64,
    ) -> Result<(), InternalError> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(now))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("soft_delete_user", e))?;

        if result.rows_affected == 0 {
            return Err(CredentialError::UserIdNotFound {
                user_id: user_id.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
