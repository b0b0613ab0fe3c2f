use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::EnvironmentProvider;

/// Secret-related failures
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Required secret '{secret_name}' is missing")]
    Missing { secret_name: String },

    #[error("Secret '{secret_name}' must be at least {expected} characters, got {actual}")]
    InvalidLength {
        secret_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Secrets '{first}' and '{second}' must differ")]
    NotDistinct { first: String, second: String },
}

/// Where and how one secret is loaded
struct SecretConfig {
    env_name: &'static str,
    min_length: usize,
}

const JWT_ACCESS_SECRET: SecretConfig = SecretConfig {
    env_name: "JWT_ACCESS_SECRET",
    min_length: 32,
};

const JWT_REFRESH_SECRET: SecretConfig = SecretConfig {
    env_name: "JWT_REFRESH_SECRET",
    min_length: 32,
};

const PASSWORD_PEPPER: SecretConfig = SecretConfig {
    env_name: "PASSWORD_PEPPER",
    min_length: 16,
};

/// Centralized manager for application secrets
pub struct SecretManager {
    jwt_access_secret: String,
    jwt_refresh_secret: String,
    password_pepper: String,
}

impl SecretManager {
    /// Load and validate all secrets from the environment provider
    ///
    /// # Errors
    /// Returns `SecretError` if any required secret is missing, too short, or
    /// the access and refresh signing secrets are equal
    pub fn from_env_provider(
        env_provider: Arc<dyn EnvironmentProvider + Send + Sync>,
    ) -> Result<Self, SecretError> {
        let load = |config: &SecretConfig| {
            env_provider
                .get_var(config.env_name)
                .ok_or_else(|| SecretError::Missing {
                    secret_name: config.env_name.to_string(),
                })
        };

        Self::new(
            load(&JWT_ACCESS_SECRET)?,
            load(&JWT_REFRESH_SECRET)?,
            load(&PASSWORD_PEPPER)?,
        )
    }

    /// Build from explicit values, applying the same validation as environment loading
    pub fn new(
        jwt_access_secret: impl Into<String>,
        jwt_refresh_secret: impl Into<String>,
        password_pepper: impl Into<String>,
    ) -> Result<Self, SecretError> {
        let jwt_access_secret = jwt_access_secret.into();
        let jwt_refresh_secret = jwt_refresh_secret.into();
        let password_pepper = password_pepper.into();

        validate_length(&JWT_ACCESS_SECRET, &jwt_access_secret)?;
        validate_length(&JWT_REFRESH_SECRET, &jwt_refresh_secret)?;
        validate_length(&PASSWORD_PEPPER, &password_pepper)?;

        if jwt_access_secret == jwt_refresh_secret {
            return Err(SecretError::NotDistinct {
                first: JWT_ACCESS_SECRET.env_name.to_string(),
                second: JWT_REFRESH_SECRET.env_name.to_string(),
            });
        }

        Ok(Self {
            jwt_access_secret,
            jwt_refresh_secret,
            password_pepper,
        })
    }

    /// Signing key for access tokens
    pub fn jwt_access_secret(&self) -> &str {
        &self.jwt_access_secret
    }

    /// Signing key for refresh tokens
    pub fn jwt_refresh_secret(&self) -> &str {
        &self.jwt_refresh_secret
    }

    /// Get the pepper for password hashing
    pub fn password_pepper(&self) -> &str {
        &self.password_pepper
    }
}

fn validate_length(config: &SecretConfig, value: &str) -> Result<(), SecretError> {
    let actual = value.chars().count();
    if actual < config.min_length {
        return Err(SecretError::InvalidLength {
            secret_name: config.env_name.to_string(),
            expected: config.min_length,
            actual,
        });
    }
    Ok(())
}

impl fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretManager")
            .field("jwt_access_secret", &"<redacted>")
            .field("jwt_refresh_secret", &"<redacted>")
            .field("password_pepper", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretManager {{ secrets_loaded: 3 }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    const ACCESS: &str = "access-secret-with-at-least-32-characters";
    const REFRESH: &str = "refresh-secret-with-at-least-32-characters";
    const PEPPER: &str = "pepper-16-chars!";

    fn env(vars: &[(&str, &str)]) -> Arc<MockEnvironment> {
        Arc::new(MockEnvironment::empty().with_vars(vars))
    }

    #[test]
    fn test_successful_initialization_with_valid_secrets() {
        let manager = SecretManager::from_env_provider(env(&[
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
            ("PASSWORD_PEPPER", PEPPER),
        ]))
        .unwrap();

        assert_eq!(manager.jwt_access_secret(), ACCESS);
        assert_eq!(manager.jwt_refresh_secret(), REFRESH);
        assert_eq!(manager.password_pepper(), PEPPER);
    }

    #[test]
    fn test_missing_refresh_secret() {
        let result = SecretManager::from_env_provider(env(&[
            ("JWT_ACCESS_SECRET", ACCESS),
            ("PASSWORD_PEPPER", PEPPER),
        ]));
        match result {
            Err(SecretError::Missing { secret_name }) => assert_eq!(secret_name, "JWT_REFRESH_SECRET"),
            other => panic!("Expected Missing, got {:?}", other),
        }
    }

    #[test]
    fn test_short_pepper_rejected() {
        let result = SecretManager::new(ACCESS, REFRESH, "short");
        assert!(matches!(
            result,
            Err(SecretError::InvalidLength { expected: 16, actual: 5, .. })
        ));
    }

    #[test]
    fn test_identical_signing_secrets_rejected() {
        let result = SecretManager::new(ACCESS, ACCESS, PEPPER);
        assert!(matches!(result, Err(SecretError::NotDistinct { .. })));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let manager = SecretManager::new(ACCESS, REFRESH, PEPPER).unwrap();
        let debug = format!("{:?}", manager);
        assert!(!debug.contains(ACCESS));
        assert!(!debug.contains(PEPPER));
        assert!(debug.contains("<redacted>"));
        assert_eq!(manager.to_string(), "SecretManager { secrets_loaded: 3 }");
    }
}
