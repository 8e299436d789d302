/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub use sea_orm_migration::prelude::*;

mod m20260113_090000_create_table_user;
mod m20260113_090100_create_table_wallet;
mod m20260113_090200_create_table_build;
mod m20260113_090300_create_table_share;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260113_090000_create_table_user::Migration),
            Box::new(m20260113_090100_create_table_wallet::Migration),
            Box::new(m20260113_090200_create_table_build::Migration),
            Box::new(m20260113_090300_create_table_share::Migration),
        ]
    }
}
