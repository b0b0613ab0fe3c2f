use thiserror::Error;

use crate::types::internal::access::DenyReason;

#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Access denied: {reason}")]
    Forbidden { reason: DenyReason },

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Role name already exists: {0}")]
    DuplicateRoleName(String),

    #[error("Permission not found: {0}")]
    PermissionNotFound(String),

    #[error("Facility not found: {0}")]
    FacilityNotFound(String),

    #[error("Role already assigned")]
    DuplicateAssignment,

    #[error("Permission already granted")]
    DuplicateGrant,

    #[error("Role assignment not found: {0}")]
    AssignmentNotFound(String),

    #[error("Permission grant not found: {0}")]
    GrantNotFound(String),

    #[error("System role cannot be modified: {0}")]
    SystemRoleProtected(String),
}
