#[cfg(test)]
mod tests {
    use crate::errors::internal::{
        AuthorizationError, CredentialError, InternalError, JwtFailClass, JwtValidationError,
        PasswordPolicyError, RateLimitError,
    };
    use crate::types::internal::access::DenyReason;
    use crate::types::internal::auth::TokenType;
    use sea_orm::DbErr;

    #[test]
    fn test_database_error_includes_operation() {
        let db_err = DbErr::RecordNotFound("test record".to_string());
        let error = InternalError::database("find_user", db_err);

        let error_string = error.to_string();
        assert!(error_string.contains("find_user"));
        assert!(error_string.contains("Database error"));
        assert!(error.is_internal());
    }

    #[test]
    fn test_parse_error_includes_value_type() {
        let error = InternalError::parse("blacklist", "expected array");

        let error_string = error.to_string();
        assert!(error_string.contains("blacklist"));
        assert!(error_string.contains("expected array"));
        assert!(error_string.contains("Parse error"));
    }

    #[test]
    fn test_crypto_error_includes_operation() {
        let error = InternalError::crypto("argon2_init", "invalid secret length");

        let error_string = error.to_string();
        assert!(error_string.contains("argon2_init"));
        assert!(error_string.contains("invalid secret length"));
    }

    #[test]
    fn test_policy_violation_joins_messages() {
        let error = PasswordPolicyError::PolicyViolation(vec![
            "Password must be at least 8 characters".to_string(),
            "Password must contain at least one number".to_string(),
        ]);

        assert_eq!(
            error.message(),
            "Password must be at least 8 characters. Password must contain at least one number"
        );
    }

    #[test]
    fn test_data_integrity_fault_is_internal() {
        let error = InternalError::from(CredentialError::data_integrity("user-1", "hash missing"));
        assert!(error.is_internal());
        assert!(error.to_string().contains("user-1"));
    }

    #[test]
    fn test_domain_errors_are_not_internal() {
        assert!(!InternalError::from(CredentialError::InvalidCredentials).is_internal());
        assert!(!InternalError::from(RateLimitError::Blocked { retry_after_seconds: 30 }).is_internal());
        assert!(!InternalError::from(AuthorizationError::Forbidden {
            reason: DenyReason::NoPermissions
        })
        .is_internal());
    }

    #[test]
    fn test_forbidden_displays_reason_code() {
        let error = AuthorizationError::Forbidden {
            reason: DenyReason::MissingPermissions,
        };
        assert_eq!(error.to_string(), "Access denied: MISSING_PERMISSIONS");
    }

    #[test]
    fn test_wrong_token_type_is_classified() {
        let error = JwtValidationError::wrong_type(TokenType::Refresh);
        assert_eq!(error.class, JwtFailClass::WrongTokenType);
        assert!(!error.is_expired());
    }
}
