mod auth_settings;
mod config_spec;
pub mod database;
mod env_provider;
pub mod errors;
mod logging;
mod secret_manager;

pub use auth_settings::{AuthSettings, HashSettings, LockoutSettings, RateLimitBackend};
pub use config_spec::ConfigSpec;
pub use database::DatabaseConnections;
pub use env_provider::{EnvironmentProvider, MockEnvironment, SystemEnvironment};
pub use errors::ConfigError;
pub use logging::{AUDIT_TARGET, LoggingConfig, LoggingError, init_logging};
pub use secret_manager::{SecretError, SecretManager};
