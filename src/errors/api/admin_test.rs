use crate::errors::AdminError;
use crate::errors::internal::{AuthorizationError, CredentialError, InternalError};
use crate::types::internal::access::DenyReason;

#[test]
fn test_duplicate_assignment_is_conflict() {
    let err = AdminError::from_internal_error(AuthorizationError::DuplicateAssignment.into());
    assert_eq!(err.status_code(), 409);
    assert_eq!(err.message(), "Role already assigned");
}

#[test]
fn test_missing_records_are_not_found() {
    let role = AdminError::from_internal_error(AuthorizationError::RoleNotFound("r1".into()).into());
    let user = AdminError::from_internal_error(
        CredentialError::UserIdNotFound { user_id: "u1".into() }.into(),
    );
    let assignment =
        AdminError::from_internal_error(AuthorizationError::AssignmentNotFound("a1".into()).into());

    assert_eq!(role.message(), "Role not found");
    assert_eq!(user.message(), "User not found");
    assert_eq!(assignment.message(), "User role not found");
    assert!([role, user, assignment].iter().all(|e| e.status_code() == 404));
}

#[test]
fn test_forbidden_hides_reason() {
    let err = AdminError::from_internal_error(
        AuthorizationError::Forbidden { reason: DenyReason::MissingPermissions }.into(),
    );
    assert_eq!(err.status_code(), 403);
    assert_eq!(err.message(), "Insufficient permissions");
}

#[test]
fn test_system_role_protected() {
    let err = AdminError::from_internal_error(
        AuthorizationError::SystemRoleProtected("Super Admin".into()).into(),
    );
    assert!(matches!(err, AdminError::SystemRoleProtected(_)));
}

#[test]
fn test_internal_error_is_generic() {
    let err = AdminError::from_internal_error(InternalError::crypto("argon2", "boom"));
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.message(), "An internal error occurred");
}
