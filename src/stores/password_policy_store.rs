use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::types::db::password_policy;

/// Column values for a new policy; the row is always created active
#[derive(Debug, Clone)]
pub struct NewPasswordPolicy {
    pub name: String,
    pub facility_id: Option<String>,
    pub min_length: i32,
    pub max_length: i32,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
    pub allowed_special_chars: Option<String>,
    pub password_history_count: i32,
    pub max_failed_attempts: i32,
    pub lockout_duration_minutes: i32,
    pub min_age_days: i32,
    pub common_passwords_blacklist: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Default)]
pub struct PasswordPolicyStore;

impl PasswordPolicyStore {
    pub fn new() -> Self {
        Self
    }

    /// Active policy scoped to exactly this facility (newest wins if several)
    pub async fn find_active_for_facility(
        &self,
        conn: &impl ConnectionTrait,
        facility_id: &str,
    ) -> Result<Option<password_policy::Model>, InternalError> {
        password_policy::Entity::find()
            .filter(password_policy::Column::FacilityId.eq(facility_id))
            .filter(password_policy::Column::IsActive.eq(true))
            .order_by_desc(password_policy::Column::CreatedAt)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_facility_policy", e))
    }

    /// Active global default policy
    pub async fn find_default(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Option<password_policy::Model>, InternalError> {
        password_policy::Entity::find()
            .filter(password_policy::Column::IsDefault.eq(true))
            .filter(password_policy::Column::IsActive.eq(true))
            .order_by_desc(password_policy::Column::CreatedAt)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_default_policy", e))
    }

    /// Active policies, either all of them or those visible to one facility
    /// (its own plus the unscoped ones)
    pub async fn list_active(
        &self,
        conn: &impl ConnectionTrait,
        facility_id: Option<&str>,
    ) -> Result<Vec<password_policy::Model>, InternalError> {
        let mut query =
            password_policy::Entity::find().filter(password_policy::Column::IsActive.eq(true));

        if let Some(facility_id) = facility_id {
            query = query.filter(
                Condition::any()
                    .add(password_policy::Column::FacilityId.eq(facility_id))
                    .add(password_policy::Column::FacilityId.is_null()),
            );
        }

        query
            .order_by_asc(password_policy::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_policies", e))
    }

    /// Insert a policy; a new default demotes any previous default
    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        policy: NewPasswordPolicy,
        now: i64,
    ) -> Result<password_policy::Model, InternalError> {
        if policy.is_default {
            password_policy::Entity::update_many()
                .col_expr(password_policy::Column::IsDefault, Expr::value(false))
                .col_expr(password_policy::Column::UpdatedAt, Expr::value(now))
                .filter(password_policy::Column::IsDefault.eq(true))
                .exec(conn)
                .await
                .map_err(|e| InternalError::database("clear_default_policy", e))?;
        }

        password_policy::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(policy.name),
            facility_id: Set(policy.facility_id),
            min_length: Set(policy.min_length),
            max_length: Set(policy.max_length),
            require_uppercase: Set(policy.require_uppercase),
            require_lowercase: Set(policy.require_lowercase),
            require_numbers: Set(policy.require_numbers),
            require_special_chars: Set(policy.require_special_chars),
            allowed_special_chars: Set(policy.allowed_special_chars),
            password_history_count: Set(policy.password_history_count),
            max_failed_attempts: Set(policy.max_failed_attempts),
            lockout_duration_minutes: Set(policy.lockout_duration_minutes),
            min_age_days: Set(policy.min_age_days),
            common_passwords_blacklist: Set(policy.common_passwords_blacklist),
            is_default: Set(policy.is_default),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("create_policy", e))
    }
}
