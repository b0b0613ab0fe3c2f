use std::str::FromStr;
use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::errors::ConfigError;

/// Specification for one environment-backed setting
///
/// Priority is environment variable, then default. Validation runs on whichever value wins.
pub struct ConfigSpec {
    env_provider: Arc<dyn EnvironmentProvider + Send + Sync>,
    env_name: Option<String>,
    default_value: Option<String>,
    min_length: Option<usize>,
    validator: Option<fn(&str) -> Result<(), String>>,
}

impl ConfigSpec {
    pub fn new(env_provider: Arc<dyn EnvironmentProvider + Send + Sync>) -> Self {
        Self {
            env_provider,
            env_name: None,
            default_value: None,
            min_length: None,
            validator: None,
        }
    }

    pub fn env_override(mut self, name: &str) -> Self {
        self.env_name = Some(name.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn validator(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.validator = Some(f);
        self
    }

    fn name(&self) -> &str {
        self.env_name.as_deref().unwrap_or("<unnamed>")
    }

    /// Resolve the raw string value
    pub fn load(&self) -> Result<String, ConfigError> {
        let from_env = self
            .env_name
            .as_deref()
            .and_then(|name| self.env_provider.get_var(name));

        let value = match from_env.or_else(|| self.default_value.clone()) {
            Some(value) => value,
            None => {
                return Err(ConfigError::MissingSetting {
                    setting_name: self.name().to_string(),
                });
            }
        };

        if let Some(min_len) = self.min_length {
            if value.len() < min_len {
                return Err(ConfigError::invalid(
                    self.name(),
                    format!("must be at least {} characters long", min_len),
                ));
            }
        }

        if let Some(validator) = self.validator {
            validator(&value).map_err(|reason| ConfigError::invalid(self.name(), reason))?;
        }

        Ok(value)
    }

    /// Resolve and parse, rejecting values outside `min..=max`
    pub fn load_in_range<T>(&self, min: T, max: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + std::fmt::Display + Copy,
        T::Err: std::fmt::Display,
    {
        let raw = self.load()?;
        let parsed = raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            setting_name: self.name().to_string(),
            error: format!("'{}': {}", raw, e),
        })?;

        if parsed < min || parsed > max {
            return Err(ConfigError::invalid(
                self.name(),
                format!("{} is outside valid range {}-{}", parsed, min, max),
            ));
        }

        Ok(parsed)
    }

    /// Validate a host address (IPv4, IPv6, or hostname); no DNS resolution
    pub fn validate_host_address(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Host address cannot be empty".to_string());
        }
        if value.parse::<std::net::IpAddr>().is_ok() {
            return Ok(());
        }
        let valid_hostname = value
            .split('.')
            .all(|label| {
                !label.is_empty()
                    && label.len() <= 63
                    && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                    && !label.starts_with('-')
                    && !label.ends_with('-')
            });
        if valid_hostname {
            Ok(())
        } else {
            Err(format!("Invalid host address: {}", value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    fn env(vars: &[(&str, &str)]) -> Arc<MockEnvironment> {
        Arc::new(MockEnvironment::empty().with_vars(vars))
    }

    #[test]
    fn test_env_value_overrides_default() {
        let value = ConfigSpec::new(env(&[("PORT", "8080")]))
            .env_override("PORT")
            .default_value("3000")
            .load()
            .unwrap();
        assert_eq!(value, "8080");
    }

    #[test]
    fn test_missing_without_default_fails() {
        let result = ConfigSpec::new(env(&[])).env_override("NOPE").load();
        assert!(matches!(result, Err(ConfigError::MissingSetting { .. })));
    }

    #[test]
    fn test_range_rejects_out_of_bounds() {
        let result = ConfigSpec::new(env(&[("ACCESS_TOKEN_TTL_SECONDS", "60")]))
            .env_override("ACCESS_TOKEN_TTL_SECONDS")
            .load_in_range::<i64>(900, 28_800);
        match result {
            Err(ConfigError::InvalidSetting { setting_name, reason }) => {
                assert_eq!(setting_name, "ACCESS_TOKEN_TTL_SECONDS");
                assert!(reason.contains("outside valid range"));
            }
            other => panic!("Expected InvalidSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_range_rejects_garbage() {
        let result = ConfigSpec::new(env(&[("PORT", "eighty")]))
            .env_override("PORT")
            .load_in_range::<u16>(1, 65535);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_host_validation() {
        assert!(ConfigSpec::validate_host_address("0.0.0.0").is_ok());
        assert!(ConfigSpec::validate_host_address("::1").is_ok());
        assert!(ConfigSpec::validate_host_address("auth.internal").is_ok());
        assert!(ConfigSpec::validate_host_address("").is_err());
        assert!(ConfigSpec::validate_host_address("bad host").is_err());
    }
}
