pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_access_tables;
mod m20260301_000002_create_password_policy_tables;
mod m20260301_000003_create_login_attempts;
mod m20260301_000004_create_audit_events;

pub struct AuthMigrator;

#[async_trait::async_trait]
impl MigratorTrait for AuthMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_access_tables::Migration),
            Box::new(m20260301_000002_create_password_policy_tables::Migration),
            Box::new(m20260301_000003_create_login_attempts::Migration),
        ]
    }
}

pub struct AuditMigrator;

#[async_trait::async_trait]
impl MigratorTrait for AuditMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000004_create_audit_events::Migration),
        ]
    }
}
