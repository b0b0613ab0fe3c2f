use migration::{AuditMigrator, AuthMigrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use crate::config::AuthSettings;
use crate::errors::InternalError;

/// Connections to the auth database and the separate audit database
#[derive(Debug, Clone)]
pub struct DatabaseConnections {
    pub auth: DatabaseConnection,
    pub audit: DatabaseConnection,
}

impl DatabaseConnections {
    /// Connect both databases. Does NOT run migrations - call `migrate()` separately.
    pub async fn connect(settings: &AuthSettings) -> Result<Self, InternalError> {
        let auth = connect_database(settings.database_url(), "connect_database").await?;
        let audit = connect_database(settings.audit_database_url(), "connect_audit_database").await?;

        Ok(Self { auth, audit })
    }

    pub async fn migrate(&self) -> Result<(), InternalError> {
        migrate_auth_database(&self.auth).await?;
        migrate_audit_database(&self.audit).await?;

        Ok(())
    }
}

async fn connect_database(url: &str, operation: &str) -> Result<DatabaseConnection, InternalError> {
    let db = Database::connect(url)
        .await
        .map_err(|e| InternalError::database(operation, e))?;

    tracing::debug!("{}: connected to {}", operation, url);

    Ok(db)
}

/// Run pending migrations on the auth database
pub async fn migrate_auth_database(db: &DatabaseConnection) -> Result<(), InternalError> {
    AuthMigrator::up(db, None)
        .await
        .map_err(|e| InternalError::database("run_migrations", e))?;

    tracing::debug!("Auth database migrations completed");

    Ok(())
}

/// Run pending migrations on the audit database
pub async fn migrate_audit_database(audit_db: &DatabaseConnection) -> Result<(), InternalError> {
    AuditMigrator::up(audit_db, None)
        .await
        .map_err(|e| InternalError::database("run_audit_migrations", e))?;

    tracing::debug!("Audit database migrations completed");

    Ok(())
}
