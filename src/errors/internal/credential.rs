use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    /// Unknown identifier or wrong password; the two are indistinguishable to callers
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is locked for another {remaining_seconds}s")]
    AccountLocked { remaining_seconds: i64 },

    #[error("Account is not active")]
    AccountInactive,

    #[error("MFA code required")]
    MfaRequired,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("User ID not found: {user_id}")]
    UserIdNotFound { user_id: String },

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    /// Stored password hash is missing or unparseable
    #[error("Credential data integrity fault for user {user_id}: {reason}")]
    DataIntegrityFault { user_id: String, reason: String },
}

impl CredentialError {
    pub fn data_integrity(user_id: &str, reason: impl Into<String>) -> Self {
        Self::DataIntegrityFault {
            user_id: user_id.to_string(),
            reason: reason.into(),
        }
    }
}
