use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ConfigError;

/// Storage used by the login rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// Process-local table
    Memory,
    /// `login_attempts` table, shared by every instance on the same database
    Database,
}

impl FromStr for RateLimitBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "database" | "db" => Ok(Self::Database),
            other => Err(format!("Unknown rate limit backend '{}', expected memory or database", other)),
        }
    }
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashSettings {
    /// Iterations
    pub cost: u32,
    pub memory_kib: u32,
}

/// Account lockout defaults, used when no default password policy is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutSettings {
    pub threshold: i32,
    pub duration_seconds: i64,
}

/// Startup settings for the auth service
pub struct AuthSettings {
    database_url: String,
    audit_database_url: String,
    server_host: String,
    server_port: u16,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    hash: HashSettings,
    lockout: LockoutSettings,
    rate_limit_backend: RateLimitBackend,
}

impl AuthSettings {
    /// Load settings from the given environment provider
    pub fn from_env_provider(
        env_provider: Arc<dyn EnvironmentProvider + Send + Sync>,
    ) -> Result<Self, ConfigError> {
        let spec = |name: &str, default: &str| {
            ConfigSpec::new(env_provider.clone())
                .env_override(name)
                .default_value(default)
        };

        let database_url = spec("DATABASE_URL", "sqlite://hms_auth.db?mode=rwc")
            .min_length(1)
            .load()?;
        let audit_database_url = spec("AUDIT_DATABASE_URL", "sqlite://hms_audit.db?mode=rwc")
            .min_length(1)
            .load()?;
        let server_host = spec("HOST", "0.0.0.0")
            .validator(ConfigSpec::validate_host_address)
            .load()?;
        let server_port = spec("PORT", "3000").load_in_range::<u16>(1, 65535)?;

        // 15 minutes to 8 hours
        let access_token_ttl_seconds =
            spec("ACCESS_TOKEN_TTL_SECONDS", "900").load_in_range::<i64>(900, 28_800)?;
        let refresh_token_ttl_seconds =
            spec("REFRESH_TOKEN_TTL_SECONDS", "604800").load_in_range::<i64>(3_600, 7_776_000)?;

        let hash = HashSettings {
            cost: spec("PASSWORD_HASH_COST", "3").load_in_range::<u32>(1, 10)?,
            memory_kib: spec("PASSWORD_HASH_MEMORY_KIB", "19456").load_in_range::<u32>(8, 1_048_576)?,
        };

        let lockout = LockoutSettings {
            threshold: spec("LOCKOUT_THRESHOLD", "5").load_in_range::<i32>(1, 100)?,
            duration_seconds: spec("LOCKOUT_DURATION_SECONDS", "900").load_in_range::<i64>(1, 86_400)?,
        };

        let backend_raw = spec("LOGIN_RATE_LIMIT_BACKEND", "memory").load()?;
        let rate_limit_backend = backend_raw
            .parse::<RateLimitBackend>()
            .map_err(|reason| ConfigError::invalid("LOGIN_RATE_LIMIT_BACKEND", reason))?;

        Ok(Self {
            database_url,
            audit_database_url,
            server_host,
            server_port,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            hash,
            lockout,
            rate_limit_backend,
        })
    }

    /// Convenience method that uses the system environment provider
    pub fn from_env() -> Result<Self, ConfigError> {
        use crate::config::SystemEnvironment;
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn audit_database_url(&self) -> &str {
        &self.audit_database_url
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    pub fn hash(&self) -> HashSettings {
        self.hash
    }

    pub fn lockout(&self) -> LockoutSettings {
        self.lockout
    }

    pub fn rate_limit_backend(&self) -> RateLimitBackend {
        self.rate_limit_backend
    }

    /// Override hashing cost; tests use the cheapest parameters
    pub fn with_hash(mut self, hash: HashSettings) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_rate_limit_backend(mut self, backend: RateLimitBackend) -> Self {
        self.rate_limit_backend = backend;
        self
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("database_url", &self.database_url)
            .field("audit_database_url", &self.audit_database_url)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("hash", &self.hash)
            .field("lockout", &self.lockout)
            .field("rate_limit_backend", &self.rate_limit_backend)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    fn load(vars: &[(&str, &str)]) -> Result<AuthSettings, ConfigError> {
        AuthSettings::from_env_provider(Arc::new(MockEnvironment::empty().with_vars(vars)))
    }

    #[test]
    fn test_defaults() {
        let settings = load(&[]).unwrap();

        assert_eq!(settings.database_url(), "sqlite://hms_auth.db?mode=rwc");
        assert_eq!(settings.audit_database_url(), "sqlite://hms_audit.db?mode=rwc");
        assert_eq!(settings.server_address(), "0.0.0.0:3000");
        assert_eq!(settings.access_token_ttl_seconds(), 900);
        assert_eq!(settings.refresh_token_ttl_seconds(), 604_800);
        assert_eq!(settings.hash(), HashSettings { cost: 3, memory_kib: 19_456 });
        assert_eq!(settings.lockout(), LockoutSettings { threshold: 5, duration_seconds: 900 });
        assert_eq!(settings.rate_limit_backend(), RateLimitBackend::Memory);
    }

    #[test]
    fn test_overrides() {
        let settings = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("ACCESS_TOKEN_TTL_SECONDS", "28800"),
            ("LOGIN_RATE_LIMIT_BACKEND", "database"),
            ("LOCKOUT_THRESHOLD", "3"),
        ])
        .unwrap();

        assert_eq!(settings.server_address(), "127.0.0.1:8080");
        assert_eq!(settings.access_token_ttl_seconds(), 28_800);
        assert_eq!(settings.rate_limit_backend(), RateLimitBackend::Database);
        assert_eq!(settings.lockout().threshold, 3);
    }

    #[test]
    fn test_access_ttl_above_eight_hours_rejected() {
        let result = load(&[("ACCESS_TOKEN_TTL_SECONDS", "28801")]);
        assert!(matches!(result, Err(ConfigError::InvalidSetting { .. })));
    }

    #[test]
    fn test_hash_cost_bounds() {
        assert!(load(&[("PASSWORD_HASH_COST", "0")]).is_err());
        assert!(load(&[("PASSWORD_HASH_COST", "11")]).is_err());
        assert!(load(&[("PASSWORD_HASH_COST", "10")]).is_ok());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        match load(&[("LOGIN_RATE_LIMIT_BACKEND", "redis")]) {
            Err(ConfigError::InvalidSetting { setting_name, .. }) => {
                assert_eq!(setting_name, "LOGIN_RATE_LIMIT_BACKEND");
            }
            other => panic!("Expected InvalidSetting, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_blank_database_url_falls_back_to_default() {
        let settings = load(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(settings.database_url(), "sqlite://hms_auth.db?mode=rwc");
    }
}
