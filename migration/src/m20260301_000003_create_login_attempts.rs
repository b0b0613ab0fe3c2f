use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Shared-store backend for the login rate limiter
        manager
            .create_table(
                Table::create()
                    .table(LoginAttempts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LoginAttempts::ClientKey).string().not_null().primary_key())
                    .col(ColumnDef::new(LoginAttempts::Count).integer().not_null().default(0))
                    .col(ColumnDef::new(LoginAttempts::WindowStart).big_integer().not_null())
                    .col(ColumnDef::new(LoginAttempts::BlockedUntil).big_integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_login_attempts_window_start")
                    .table(LoginAttempts::Table)
                    .col(LoginAttempts::WindowStart)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LoginAttempts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum LoginAttempts {
    Table,
    ClientKey,
    Count,
    WindowStart,
    BlockedUntil,
}
