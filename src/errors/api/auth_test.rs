use crate::errors::AuthError;
use crate::errors::internal::{
    CredentialError, InternalError, JwtValidationError, PasswordPolicyError, RateLimitError,
};
use crate::types::internal::auth::TokenType;
use sea_orm::DbErr;

#[test]
fn test_database_error_converts_to_internal_server_error() {
    let internal_err = InternalError::database("find_user", DbErr::RecordNotFound("test".to_string()));
    let auth_err = AuthError::from_internal_error(internal_err);

    assert_eq!(auth_err.message(), "An internal error occurred");
    assert_eq!(auth_err.status_code(), 500);
}

#[test]
fn test_data_integrity_fault_is_generic_500() {
    let internal_err = InternalError::from(CredentialError::data_integrity("u1", "missing hash"));
    let auth_err = AuthError::from_internal_error(internal_err);

    assert_eq!(auth_err.message(), "An internal error occurred");
    assert!(!auth_err.message().contains("u1"));
}

#[test]
fn test_invalid_credentials_converts_correctly() {
    let auth_err = AuthError::from_internal_error(CredentialError::InvalidCredentials.into());
    assert_eq!(auth_err.message(), "Invalid credentials");
    assert_eq!(auth_err.status_code(), 401);
}

#[test]
fn test_account_locked_is_401() {
    let auth_err = AuthError::from_internal_error(
        CredentialError::AccountLocked { remaining_seconds: 600 }.into(),
    );
    assert!(matches!(auth_err, AuthError::AccountLocked(_)));
    assert_eq!(auth_err.status_code(), 401);
}

#[test]
fn test_inactive_and_mfa_messages() {
    assert_eq!(
        AuthError::from_internal_error(CredentialError::AccountInactive.into()).message(),
        "Account is not active"
    );
    let mfa = AuthError::from_internal_error(CredentialError::MfaRequired.into());
    assert_eq!(mfa.message(), "MFA code required");
    assert_eq!(mfa.status_code(), 400);
}

#[test]
fn test_policy_violations_are_joined_into_one_message() {
    let auth_err = AuthError::from(PasswordPolicyError::PolicyViolation(vec![
        "Password must contain at least one uppercase letter".to_string(),
        "Password must contain at least one special character".to_string(),
    ]));

    assert_eq!(auth_err.status_code(), 400);
    assert_eq!(
        auth_err.message(),
        "Password must contain at least one uppercase letter. Password must contain at least one special character"
    );
}

#[test]
fn test_rate_limit_carries_retry_after() {
    let auth_err = AuthError::from_internal_error(
        RateLimitError::Blocked { retry_after_seconds: 42 }.into(),
    );
    match auth_err {
        AuthError::TooManyRequests(json) => {
            assert_eq!(json.0.retry_after, 42);
            assert_eq!(json.0.status_code, 429);
        }
        other => panic!("Expected TooManyRequests, got {:?}", other),
    }
}

#[test]
fn test_refresh_errors_are_uniform() {
    let from_jwt = AuthError::from_refresh_error(JwtValidationError::wrong_type(TokenType::Refresh).into());
    let from_inactive = AuthError::from_refresh_error(CredentialError::AccountInactive.into());

    assert_eq!(from_jwt.message(), "Invalid refresh token");
    assert_eq!(from_inactive.message(), "Invalid refresh token");
}
