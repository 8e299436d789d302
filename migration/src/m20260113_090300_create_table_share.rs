/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use sea_orm_migration::prelude::*;

use super::m20260113_090000_create_table_user::User;
use super::m20260113_090200_create_table_build::Build;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Share::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Share::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Share::Build).uuid().not_null())
                    .col(ColumnDef::new(Share::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Share::PasswordHash).string())
                    .col(ColumnDef::new(Share::AccessCount).integer().not_null())
                    .col(ColumnDef::new(Share::ExpiresAt).date_time().not_null())
                    .col(ColumnDef::new(Share::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Share::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-share-build")
                            .from(Share::Table, Share::Build)
                            .to(Build::Table, Build::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-share-created_by")
                            .from(Share::Table, Share::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Share::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Share {
    Table,
    Id,
    Build,
    Code,
    PasswordHash,
    AccessCount,
    ExpiresAt,
    CreatedBy,
    CreatedAt,
}
