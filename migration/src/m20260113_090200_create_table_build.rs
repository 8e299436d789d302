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
                    .table(Build::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Build::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Build::Owner).uuid().not_null())
                    .col(ColumnDef::new(Build::Platform).integer().not_null())
                    .col(ColumnDef::new(Build::Status).integer().not_null())
                    .col(ColumnDef::new(Build::Progress).integer().not_null())
                    .col(ColumnDef::new(Build::AppName).string().not_null())
                    .col(ColumnDef::new(Build::PackageId).string().not_null())
                    .col(ColumnDef::new(Build::VersionName).string().not_null())
                    .col(ColumnDef::new(Build::VersionCode).integer().not_null())
                    .col(ColumnDef::new(Build::Url).string().not_null())
                    .col(ColumnDef::new(Build::PrivacyPolicy).text())
                    .col(ColumnDef::new(Build::IconPath).string())
                    .col(ColumnDef::new(Build::IconUrl).string())
                    .col(ColumnDef::new(Build::ErrorMessage).text())
                    .col(ColumnDef::new(Build::OutputFilePath).string())
                    .col(ColumnDef::new(Build::SourceFilePath).string())
                    .col(ColumnDef::new(Build::CiRunId).big_integer())
                    .col(ColumnDef::new(Build::CiArtifactUrl).string())
                    .col(ColumnDef::new(Build::SyncingSince).date_time())
                    .col(ColumnDef::new(Build::ExpiresAt).date_time().not_null())
                    .col(ColumnDef::new(Build::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Build::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-build-owner")
                            .from(Build::Table, Build::Owner)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-build-owner-status")
                    .table(Build::Table)
                    .col(Build::Owner)
                    .col(Build::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Build::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Build {
    Table,
    Id,
    Owner,
    Platform,
    Status,
    Progress,
    AppName,
    PackageId,
    VersionName,
    VersionCode,
    Url,
    PrivacyPolicy,
    IconPath,
    IconUrl,
    ErrorMessage,
    OutputFilePath,
    SourceFilePath,
    CiRunId,
    CiArtifactUrl,
    SyncingSince,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}
