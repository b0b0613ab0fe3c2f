use thiserror::Error;

use crate::config::secret_manager::SecretError;

/// Failures while loading startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid setting '{setting_name}': {reason}")]
    InvalidSetting { setting_name: String, reason: String },

    #[error("Failed to parse setting '{setting_name}': {error}")]
    ParseError { setting_name: String, error: String },

    #[error("Required setting '{setting_name}' is missing")]
    MissingSetting { setting_name: String },

    #[error(transparent)]
    Secret(#[from] SecretError),
}

impl ConfigError {
    pub fn invalid(setting_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting_name: setting_name.to_string(),
            reason: reason.into(),
        }
    }
}
