use crate::errors::internal::{AuthorizationError, CredentialError, InternalError};
use poem_openapi::{ApiResponse, Object, payload::Json};
use std::fmt;

/// Standardized error response for admin endpoints
#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct AdminErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Access administration error types
#[derive(ApiResponse, Debug)]
pub enum AdminError {
    /// Missing or invalid bearer token
    #[oai(status = 401)]
    Unauthorized(Json<AdminErrorResponse>),

    /// Caller lacks the required permissions or roles
    #[oai(status = 403)]
    Forbidden(Json<AdminErrorResponse>),

    /// Built-in role cannot be changed
    #[oai(status = 403)]
    SystemRoleProtected(Json<AdminErrorResponse>),

    /// User, role, permission, facility or assignment not found
    #[oai(status = 404)]
    NotFound(Json<AdminErrorResponse>),

    /// Assignment or grant already exists
    #[oai(status = 409)]
    Conflict(Json<AdminErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<AdminErrorResponse>),
}

fn body(error: &str, message: impl Into<String>, status_code: u16) -> Json<AdminErrorResponse> {
    Json(AdminErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code,
    })
}

impl AdminError {
    pub fn unauthorized() -> Self {
        AdminError::Unauthorized(body("invalid_token", "Invalid or expired token", 401))
    }

    pub fn forbidden() -> Self {
        AdminError::Forbidden(body("forbidden", "Insufficient permissions", 403))
    }

    pub fn system_role_protected() -> Self {
        AdminError::SystemRoleProtected(body(
            "system_role_protected",
            "System roles cannot be modified",
            403,
        ))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AdminError::NotFound(body("not_found", message, 404))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AdminError::Conflict(body("conflict", message, 409))
    }

    /// Convert an InternalError into the client-facing error
    pub fn from_internal_error(err: InternalError) -> Self {
        if err.is_internal() {
            tracing::error!("Internal error in admin operation: {}", err);
            return Self::internal_server_error();
        }

        match err {
            InternalError::Authorization(AuthorizationError::Forbidden { reason }) => {
                tracing::debug!("Forbidden: {}", reason);
                Self::forbidden()
            }
            InternalError::Authorization(AuthorizationError::RoleNotFound(_)) => {
                Self::not_found("Role not found")
            }
            InternalError::Authorization(AuthorizationError::PermissionNotFound(_)) => {
                Self::not_found("Permission not found")
            }
            InternalError::Authorization(AuthorizationError::FacilityNotFound(_)) => {
                Self::not_found("Facility not found")
            }
            InternalError::Authorization(AuthorizationError::AssignmentNotFound(_)) => {
                Self::not_found("User role not found")
            }
            InternalError::Authorization(AuthorizationError::GrantNotFound(_)) => {
                Self::not_found("Permission grant not found")
            }
            InternalError::Authorization(AuthorizationError::DuplicateAssignment) => {
                Self::conflict("Role already assigned")
            }
            InternalError::Authorization(AuthorizationError::DuplicateGrant) => {
                Self::conflict("Permission already granted")
            }
            InternalError::Authorization(AuthorizationError::DuplicateRoleName(_)) => {
                Self::conflict("Role name already exists")
            }
            InternalError::Authorization(AuthorizationError::SystemRoleProtected(name)) => {
                tracing::warn!("Attempt to modify system role {}", name);
                Self::system_role_protected()
            }
            InternalError::Credential(CredentialError::UserIdNotFound { .. }) => {
                Self::not_found("User not found")
            }
            InternalError::JWTValidation(_) => Self::unauthorized(),

            other => {
                tracing::error!("Unexpected error in admin operation: {}", other);
                Self::internal_server_error()
            }
        }
    }

    fn internal_server_error() -> Self {
        AdminError::InternalError(body("internal_error", "An internal error occurred", 500))
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            AdminError::Unauthorized(json)
            | AdminError::Forbidden(json)
            | AdminError::SystemRoleProtected(json)
            | AdminError::NotFound(json)
            | AdminError::Conflict(json)
            | AdminError::InternalError(json) => json.0.message.clone(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AdminError::Unauthorized(json)
            | AdminError::Forbidden(json)
            | AdminError::SystemRoleProtected(json)
            | AdminError::NotFound(json)
            | AdminError::Conflict(json)
            | AdminError::InternalError(json) => json.0.status_code,
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
