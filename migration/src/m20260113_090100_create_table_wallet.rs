/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use sea_orm_migration::prelude::*;

use super::m20260113_090000_create_table_user::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Wallet::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Wallet::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Wallet::User).uuid().not_null().unique_key())
                    .col(
                        ColumnDef::new(Wallet::DailyBuildsLimit)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Wallet::DailyBuildsUsed)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Wallet::DailyBuildsResetAt)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Wallet::FileRetentionDays)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Wallet::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Wallet::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet-user")
                            .from(Wallet::Table, Wallet::User)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Wallet::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Wallet {
    Table,
    Id,
    User,
    DailyBuildsLimit,
    DailyBuildsUsed,
    DailyBuildsResetAt,
    FileRetentionDays,
    CreatedAt,
    UpdatedAt,
}
