use crate::errors::internal::{
    AuthorizationError, CredentialError, InternalError, PasswordPolicyError, RateLimitError,
};
use poem_openapi::{ApiResponse, Object, payload::Json};
use std::fmt;

/// Standardized error response for authentication endpoints
#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct AuthErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Error body for rate-limited requests
#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct RateLimitedResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    /// Seconds until the client may try again
    pub retry_after: u64,
}

/// Authentication error types
#[derive(ApiResponse, Debug)]
pub enum AuthError {
    /// Unknown user or wrong password
    #[oai(status = 401)]
    InvalidCredentials(Json<AuthErrorResponse>),

    /// Account is locked after repeated failures
    #[oai(status = 401)]
    AccountLocked(Json<AuthErrorResponse>),

    /// Account has been deactivated
    #[oai(status = 401)]
    AccountInactive(Json<AuthErrorResponse>),

    /// Access token missing, invalid or expired
    #[oai(status = 401)]
    InvalidToken(Json<AuthErrorResponse>),

    /// Refresh token rejected
    #[oai(status = 401)]
    InvalidRefreshToken(Json<AuthErrorResponse>),

    /// MFA is enabled and no code was supplied
    #[oai(status = 400)]
    MfaRequired(Json<AuthErrorResponse>),

    /// Current password did not verify
    #[oai(status = 400)]
    IncorrectPassword(Json<AuthErrorResponse>),

    /// New password rejected by policy
    #[oai(status = 400)]
    PasswordValidationFailed(Json<AuthErrorResponse>),

    /// Caller lacks the required permissions or roles
    #[oai(status = 403)]
    Forbidden(Json<AuthErrorResponse>),

    /// Referenced record does not exist
    #[oai(status = 404)]
    NotFound(Json<AuthErrorResponse>),

    /// Too many login attempts from this client
    #[oai(status = 429)]
    TooManyRequests(Json<RateLimitedResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<AuthErrorResponse>),
}

fn body(error: &str, message: impl Into<String>, status_code: u16) -> Json<AuthErrorResponse> {
    Json(AuthErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code,
    })
}

impl AuthError {
    pub fn invalid_credentials() -> Self {
        AuthError::InvalidCredentials(body("invalid_credentials", "Invalid credentials", 401))
    }

    pub fn account_locked() -> Self {
        AuthError::AccountLocked(body(
            "account_locked",
            "Account is temporarily locked. Please try again later.",
            401,
        ))
    }

    pub fn account_inactive() -> Self {
        AuthError::AccountInactive(body("account_inactive", "Account is not active", 401))
    }

    pub fn invalid_token() -> Self {
        AuthError::InvalidToken(body("invalid_token", "Invalid or expired token", 401))
    }

    pub fn missing_auth_header() -> Self {
        AuthError::InvalidToken(body("missing_auth_header", "Missing Authorization header", 401))
    }

    pub fn invalid_refresh_token() -> Self {
        AuthError::InvalidRefreshToken(body("invalid_refresh_token", "Invalid refresh token", 401))
    }

    pub fn mfa_required() -> Self {
        AuthError::MfaRequired(body("mfa_required", "MFA code required", 400))
    }

    pub fn incorrect_password() -> Self {
        AuthError::IncorrectPassword(body("incorrect_password", "Current password is incorrect", 400))
    }

    pub fn password_validation_failed(message: impl Into<String>) -> Self {
        AuthError::PasswordValidationFailed(body("password_validation_failed", message, 400))
    }

    pub fn forbidden() -> Self {
        AuthError::Forbidden(body("forbidden", "Insufficient permissions", 403))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AuthError::NotFound(body("not_found", message, 404))
    }

    pub fn too_many_requests(retry_after: u64) -> Self {
        AuthError::TooManyRequests(Json(RateLimitedResponse {
            error: "too_many_requests".to_string(),
            message: "Too many login attempts. Please try again later.".to_string(),
            status_code: 429,
            retry_after,
        }))
    }

    /// Convert an InternalError into the client-facing error
    ///
    /// Infrastructure failures and data-integrity faults are logged in full and
    /// surface as a generic 500.
    pub fn from_internal_error(err: InternalError) -> Self {
        if err.is_internal() {
            tracing::error!("Internal error in auth operation: {}", err);
            return Self::internal_server_error();
        }

        match err {
            InternalError::Credential(CredentialError::InvalidCredentials) => Self::invalid_credentials(),
            InternalError::Credential(CredentialError::AccountLocked { remaining_seconds }) => {
                tracing::debug!("Rejected login for locked account ({}s remaining)", remaining_seconds);
                Self::account_locked()
            }
            InternalError::Credential(CredentialError::AccountInactive) => Self::account_inactive(),
            InternalError::Credential(CredentialError::MfaRequired) => Self::mfa_required(),
            InternalError::Credential(CredentialError::IncorrectPassword) => Self::incorrect_password(),
            InternalError::Credential(CredentialError::UserIdNotFound { user_id }) => {
                tracing::debug!("User not found: {}", user_id);
                Self::not_found("User not found")
            }

            InternalError::PasswordPolicy(policy_err) => {
                tracing::debug!("Password rejected: {}", policy_err);
                Self::password_validation_failed(policy_err.message())
            }

            InternalError::RateLimit(RateLimitError::Blocked { retry_after_seconds }) => {
                Self::too_many_requests(retry_after_seconds)
            }

            InternalError::JWTValidation(jwt_err) => {
                tracing::debug!("Token rejected: {}", jwt_err);
                Self::invalid_token()
            }

            InternalError::Authorization(AuthorizationError::Forbidden { reason }) => {
                tracing::debug!("Forbidden: {}", reason);
                Self::forbidden()
            }
            InternalError::Authorization(AuthorizationError::FacilityNotFound(id)) => {
                Self::not_found(format!("Facility not found: {}", id))
            }

            other => {
                tracing::error!("Unexpected error in auth operation: {}", other);
                Self::internal_server_error()
            }
        }
    }

    /// Refresh failures are uniform: anything short of an infrastructure fault is an invalid token
    pub fn from_refresh_error(err: InternalError) -> Self {
        if err.is_internal() {
            return Self::from_internal_error(err);
        }
        tracing::debug!("Refresh rejected: {}", err);
        Self::invalid_refresh_token()
    }

    /// Create a generic internal server error
    ///
    /// Always returns a generic message without exposing internal details.
    fn internal_server_error() -> Self {
        AuthError::InternalError(body("internal_error", "An internal error occurred", 500))
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            AuthError::TooManyRequests(json) => json.0.message.clone(),
            AuthError::InvalidCredentials(json)
            | AuthError::AccountLocked(json)
            | AuthError::AccountInactive(json)
            | AuthError::InvalidToken(json)
            | AuthError::InvalidRefreshToken(json)
            | AuthError::MfaRequired(json)
            | AuthError::IncorrectPassword(json)
            | AuthError::PasswordValidationFailed(json)
            | AuthError::Forbidden(json)
            | AuthError::NotFound(json)
            | AuthError::InternalError(json) => json.0.message.clone(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::TooManyRequests(json) => json.0.status_code,
            AuthError::InvalidCredentials(json)
            | AuthError::AccountLocked(json)
            | AuthError::AccountInactive(json)
            | AuthError::InvalidToken(json)
            | AuthError::InvalidRefreshToken(json)
            | AuthError::MfaRequired(json)
            | AuthError::IncorrectPassword(json)
            | AuthError::PasswordValidationFailed(json)
            | AuthError::Forbidden(json)
            | AuthError::NotFound(json)
            | AuthError::InternalError(json) => json.0.status_code,
        }
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::from_internal_error(err.into())
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
