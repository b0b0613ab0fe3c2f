use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{
    EnvFilter, Layer, filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::{EnvironmentProvider, SystemEnvironment};

/// Tracing target every audit event is mirrored to
pub const AUDIT_TARGET: &str = "audit";

/// Configuration for application logging
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub app_log_file: Option<PathBuf>,
    /// Dedicated JSON-lines sink for `audit` events, picked up by the SIEM shipper
    pub audit_log_file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn from_env_provider(env_provider: Arc<dyn EnvironmentProvider + Send + Sync>) -> Self {
        Self {
            log_level: env_provider
                .get_var("LOG_LEVEL")
                .unwrap_or_else(|| "INFO".to_string()),
            app_log_file: env_provider.get_var("APP_LOG_FILE").map(PathBuf::from),
            audit_log_file: env_provider.get_var("AUDIT_LOG_FILE").map(PathBuf::from),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("File system error: {0}")]
    FileSystemError(#[from] std::io::Error),
}

fn daily_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender, LoggingError> {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InitializationError(format!("Invalid log file path: {}", path.display())))?;

    Ok(tracing_appender::rolling::daily(directory, file_name))
}

/// Initialize the tracing subscriber with console and optional file output
///
/// Reads configuration from environment variables automatically.
pub fn init_logging() -> Result<(), LoggingError> {
    let config = LoggingConfig::from_env_provider(Arc::new(SystemEnvironment));

    let env_filter = || {
        EnvFilter::try_new(&config.log_level)
            .map_err(|e| LoggingError::InvalidLogLevel(format!("{}: {}", config.log_level, e)))
    };

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter()?);

    let file_layer = match &config.app_log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(daily_appender(path)?)
                .with_target(true)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter()?),
        ),
        None => None,
    };

    let audit_layer = match &config.audit_log_file {
        Some(path) => Some(
            fmt::layer()
                .json()
                .with_writer(daily_appender(path)?)
                .with_filter(Targets::new().with_target(AUDIT_TARGET, tracing::Level::INFO)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(audit_layer)
        .try_init()
        .map_err(|e| LoggingError::InitializationError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::from_env_provider(Arc::new(MockEnvironment::empty()));
        assert_eq!(config.log_level, "INFO");
        assert!(config.app_log_file.is_none());
        assert!(config.audit_log_file.is_none());
    }

    #[test]
    fn test_logging_config_reads_files() {
        let env = MockEnvironment::empty()
            .with_var("LOG_LEVEL", "debug,sea_orm=warn")
            .with_var("AUDIT_LOG_FILE", "/var/log/hms/audit.log");
        let config = LoggingConfig::from_env_provider(Arc::new(env));

        assert_eq!(config.log_level, "debug,sea_orm=warn");
        assert_eq!(config.audit_log_file, Some(PathBuf::from("/var/log/hms/audit.log")));
    }
}
