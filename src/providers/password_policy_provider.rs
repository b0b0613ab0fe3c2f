use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::LockoutSettings;
use crate::errors::InternalError;
use crate::errors::internal::PasswordPolicyError;
use crate::providers::clock::Clock;
use crate::providers::crypto_provider::{CryptoProvider, PasswordVerification};
use crate::stores::{NewPasswordPolicy, PasswordHistoryStore, PasswordPolicyStore};
use crate::types::db::password_policy;
use crate::types::internal::password_policy::EffectivePolicy;

const SECONDS_PER_DAY: i64 = 86_400;

/// Password policy engine
///
/// Resolves the policy that applies to a facility, validates candidate
/// passwords against it and checks them against the user's password history.
pub struct PasswordPolicyProvider {
    db: DatabaseConnection,
    policy_store: Arc<PasswordPolicyStore>,
    history_store: Arc<PasswordHistoryStore>,
    crypto: Arc<CryptoProvider>,
    clock: Arc<dyn Clock>,
}

impl PasswordPolicyProvider {
    pub fn new(
        db: DatabaseConnection,
        policy_store: Arc<PasswordPolicyStore>,
        history_store: Arc<PasswordHistoryStore>,
        crypto: Arc<CryptoProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            policy_store,
            history_store,
            crypto,
            clock,
        }
    }

    /// Facility policy, else the global default, else the built-in minimum
    pub async fn resolve(&self, facility_id: Option<&str>) -> Result<EffectivePolicy, InternalError> {
        if let Some(facility_id) = facility_id {
            if let Some(model) = self
                .policy_store
                .find_active_for_facility(&self.db, facility_id)
                .await?
            {
                return EffectivePolicy::from_model(&model);
            }
        }

        match self.policy_store.find_default(&self.db).await? {
            Some(model) => EffectivePolicy::from_model(&model),
            None => EffectivePolicy::builtin(),
        }
    }

    /// Lockout threshold and duration from the global default policy, else `fallback`
    pub async fn lockout_settings(
        &self,
        fallback: LockoutSettings,
    ) -> Result<LockoutSettings, InternalError> {
        let settings = match self.policy_store.find_default(&self.db).await? {
            Some(model) if model.max_failed_attempts > 0 && model.lockout_duration_minutes > 0 => {
                LockoutSettings {
                    threshold: model.max_failed_attempts,
                    duration_seconds: i64::from(model.lockout_duration_minutes) * 60,
                }
            }
            _ => fallback,
        };

        Ok(settings)
    }

    /// Validate against the resolved policy, reporting every violation at once
    pub async fn validate(
        &self,
        password: &str,
        user_id: Option<&str>,
        facility_id: Option<&str>,
    ) -> Result<(), InternalError> {
        let policy = self.resolve(facility_id).await?;
        let errors = violations(&policy, password);

        if errors.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            user_id = user_id.unwrap_or("-"),
            policy = %policy.name,
            violations = errors.len(),
            "Password rejected by policy"
        );
        Err(PasswordPolicyError::PolicyViolation(errors).into())
    }

    /// Reject a password matching any of the user's last N retired hashes
    pub async fn check_reuse(
        &self,
        user_id: &str,
        new_password: &str,
        facility_id: Option<&str>,
    ) -> Result<(), InternalError> {
        let policy = self.resolve(facility_id).await?;
        self.check_reuse_with(&policy, user_id, new_password).await
    }

    pub(crate) async fn check_reuse_with(
        &self,
        policy: &EffectivePolicy,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), InternalError> {
        let history = self
            .history_store
            .recent(&self.db, user_id, policy.history_count)
            .await?;

        for entry in history {
            match self
                .crypto
                .verify_password(new_password, &entry.password_hash)
                .await?
            {
                PasswordVerification::Match => {
                    return Err(PasswordPolicyError::PasswordReused.into());
                }
                PasswordVerification::Mismatch => {}
                PasswordVerification::Malformed(reason) => {
                    tracing::warn!(
                        "Skipping malformed password history entry {} for user {}: {}",
                        entry.id,
                        user_id,
                        reason
                    );
                }
            }
        }

        Ok(())
    }

    /// Reject a change while the current password is younger than the policy minimum age
    pub fn check_min_age(
        &self,
        policy: &EffectivePolicy,
        password_changed_at: Option<i64>,
    ) -> Result<(), PasswordPolicyError> {
        if policy.min_age_days <= 0 {
            return Ok(());
        }
        let Some(changed_at) = password_changed_at else {
            return Ok(());
        };

        let min_age_seconds = i64::from(policy.min_age_days) * SECONDS_PER_DAY;
        if self.clock.now_timestamp() - changed_at < min_age_seconds {
            return Err(PasswordPolicyError::PasswordTooRecent {
                min_age_days: policy.min_age_days,
            });
        }

        Ok(())
    }

    /// Store a new policy; created active, a new default replaces the old one
    pub async fn create_policy(
        &self,
        policy: NewPasswordPolicy,
    ) -> Result<password_policy::Model, InternalError> {
        if policy.min_length < 1 {
            return Err(PasswordPolicyError::InvalidPolicy(
                "minLength must be at least 1".to_string(),
            )
            .into());
        }
        if policy.max_length > 0 && policy.max_length < policy.min_length {
            return Err(PasswordPolicyError::InvalidPolicy(
                "maxLength must not be less than minLength".to_string(),
            )
            .into());
        }
        if let Some(raw) = policy.common_passwords_blacklist.as_deref() {
            serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
                PasswordPolicyError::InvalidPolicy(format!(
                    "commonPasswordsBlacklist must be a JSON array of strings: {}",
                    e
                ))
            })?;
        }

        self.policy_store
            .create(&self.db, policy, self.clock.now_timestamp())
            .await
    }

    pub async fn list_policies(
        &self,
        facility_id: Option<&str>,
    ) -> Result<Vec<password_policy::Model>, InternalError> {
        self.policy_store.list_active(&self.db, facility_id).await
    }
}

/// Every rule `password` breaks, in evaluation order
///
/// Lengths count characters, not bytes.
pub fn violations(policy: &EffectivePolicy, password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let length = password.chars().count();

    if length < policy.min_length {
        errors.push(format!(
            "Password must be at least {} characters",
            policy.min_length
        ));
    }
    if let Some(max_length) = policy.max_length {
        if length > max_length {
            errors.push(format!("Password must be at most {} characters", max_length));
        }
    }
    if policy.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if policy.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if policy.require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }
    if policy.require_special_chars && !policy.special_pattern.is_match(password) {
        errors.push("Password must contain at least one special character".to_string());
    }
    if policy.blacklist.contains(&password.to_lowercase()) {
        errors.push("Password is too common. Please choose a stronger password".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::internal::password_policy::special_char_pattern;

    fn strict_policy() -> EffectivePolicy {
        let mut policy = EffectivePolicy::builtin().unwrap();
        policy.min_length = 10;
        policy.max_length = Some(64);
        policy.require_uppercase = true;
        policy.require_lowercase = true;
        policy.require_numbers = true;
        policy.require_special_chars = true;
        policy.blacklist = vec!["password123!".to_string()];
        policy
    }

    #[test]
    fn test_compliant_password_has_no_violations() {
        assert!(violations(&strict_policy(), "Ward7#Night").is_empty());
    }

    #[test]
    fn test_removing_one_class_adds_exactly_one_violation() {
        let policy = strict_policy();

        assert_eq!(
            violations(&policy, "ward7#night"),
            vec!["Password must contain at least one uppercase letter".to_string()]
        );
        assert_eq!(
            violations(&policy, "WARD7#NIGHT"),
            vec!["Password must contain at least one lowercase letter".to_string()]
        );
        assert_eq!(
            violations(&policy, "Ward#Nights"),
            vec!["Password must contain at least one number".to_string()]
        );
        assert_eq!(
            violations(&policy, "Ward7Nights"),
            vec!["Password must contain at least one special character".to_string()]
        );
    }

    #[test]
    fn test_all_violations_reported_in_order() {
        let errors = violations(&strict_policy(), "abc");

        assert_eq!(
            errors,
            vec![
                "Password must be at least 10 characters".to_string(),
                "Password must contain at least one uppercase letter".to_string(),
                "Password must contain at least one number".to_string(),
                "Password must contain at least one special character".to_string(),
            ]
        );
    }

    #[test]
    fn test_max_length_counts_characters() {
        let mut policy = EffectivePolicy::builtin().unwrap();
        policy.min_length = 1;
        policy.max_length = Some(4);

        // Four characters, more than four bytes
        assert!(violations(&policy, "éééé").is_empty());
        assert_eq!(
            violations(&policy, "ééééé"),
            vec!["Password must be at most 4 characters".to_string()]
        );
    }

    #[test]
    fn test_blacklist_is_case_insensitive() {
        let errors = violations(&strict_policy(), "PASSWORD123!");

        assert!(errors.contains(
            &"Password is too common. Please choose a stronger password".to_string()
        ));
    }

    #[test]
    fn test_custom_special_set_is_used() {
        let mut policy = strict_policy();
        policy.special_chars = "~".to_string();
        policy.special_pattern = special_char_pattern("~").unwrap();

        assert!(violations(&policy, "Ward7~Night").is_empty());
        assert_eq!(
            violations(&policy, "Ward7#Night"),
            vec!["Password must contain at least one special character".to_string()]
        );
    }

    #[test]
    fn test_builtin_policy_only_checks_length() {
        let policy = EffectivePolicy::builtin().unwrap();

        assert!(violations(&policy, "abcdefgh").is_empty());
        assert_eq!(
            violations(&policy, "short"),
            vec!["Password must be at least 8 characters".to_string()]
        );
    }
}
