use sea_orm_migration::prelude::*;

use crate::m20260301_000001_create_access_tables::{Facilities, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PasswordPolicies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PasswordPolicies::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(PasswordPolicies::Name).string().not_null())
                    .col(ColumnDef::new(PasswordPolicies::FacilityId).string().null())
                    .col(ColumnDef::new(PasswordPolicies::MinLength).integer().not_null().default(8))
                    .col(ColumnDef::new(PasswordPolicies::MaxLength).integer().not_null().default(128))
                    .col(ColumnDef::new(PasswordPolicies::RequireUppercase).boolean().not_null().default(true))
                    .col(ColumnDef::new(PasswordPolicies::RequireLowercase).boolean().not_null().default(true))
                    .col(ColumnDef::new(PasswordPolicies::RequireNumbers).boolean().not_null().default(true))
                    .col(ColumnDef::new(PasswordPolicies::RequireSpecialChars).boolean().not_null().default(true))
                    .col(ColumnDef::new(PasswordPolicies::AllowedSpecialChars).string().null())
                    .col(ColumnDef::new(PasswordPolicies::PasswordHistoryCount).integer().not_null().default(5))
                    .col(ColumnDef::new(PasswordPolicies::MaxFailedAttempts).integer().not_null().default(5))
                    .col(ColumnDef::new(PasswordPolicies::LockoutDurationMinutes).integer().not_null().default(15))
                    .col(ColumnDef::new(PasswordPolicies::MinAgeDays).integer().not_null().default(0))
                    .col(ColumnDef::new(PasswordPolicies::CommonPasswordsBlacklist).text().null())
                    .col(ColumnDef::new(PasswordPolicies::IsDefault).boolean().not_null().default(false))
                    .col(ColumnDef::new(PasswordPolicies::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(PasswordPolicies::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(PasswordPolicies::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_password_policies_facility_id")
                            .from(PasswordPolicies::Table, PasswordPolicies::FacilityId)
                            .to(Facilities::Table, Facilities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_password_policies_facility_id")
                    .table(PasswordPolicies::Table)
                    .col(PasswordPolicies::FacilityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PasswordHistory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PasswordHistory::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(PasswordHistory::UserId).string().not_null())
                    .col(ColumnDef::new(PasswordHistory::PasswordHash).string().not_null())
                    .col(ColumnDef::new(PasswordHistory::ChangedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_password_history_user_id")
                            .from(PasswordHistory::Table, PasswordHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_password_history_user_changed_at")
                    .table(PasswordHistory::Table)
                    .col(PasswordHistory::UserId)
                    .col(PasswordHistory::ChangedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PasswordHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PasswordPolicies::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum PasswordPolicies {
    Table,
    Id,
    Name,
    FacilityId,
    MinLength,
    MaxLength,
    RequireUppercase,
    RequireLowercase,
    RequireNumbers,
    RequireSpecialChars,
    AllowedSpecialChars,
    PasswordHistoryCount,
    MaxFailedAttempts,
    LockoutDurationMinutes,
    MinAgeDays,
    CommonPasswordsBlacklist,
    IsDefault,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PasswordHistory {
    Table,
    Id,
    UserId,
    PasswordHash,
    ChangedAt,
}
