use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordPolicyError {
    /// Every failed rule, in evaluation order
    #[error("{}", .0.join(". "))]
    PolicyViolation(Vec<String>),

    #[error("Password was used recently. Please choose a different password.")]
    PasswordReused,

    #[error("Password was changed less than {min_age_days} day(s) ago")]
    PasswordTooRecent { min_age_days: i32 },

    #[error("Invalid password policy: {0}")]
    InvalidPolicy(String),
}

impl PasswordPolicyError {
    /// Violations joined into the single message returned to clients
    pub fn message(&self) -> String {
        self.to_string()
    }
}
