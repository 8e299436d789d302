/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use chrono::Utc;
use entity::build::BuildStatus;
use migration::Migrator;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectOptions, Database, DatabaseConnection,
    EntityTrait, QueryFilter,
};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::info;
use tracing::log::LevelFilter;

use super::quota::refund_daily_quota;
use super::types::*;

pub async fn connect_db(cli: &Cli) -> Result<DatabaseConnection> {
    let db_url = if let Some(file) = &cli.database_url_file {
        std::fs::read_to_string(file).context("Failed to read database url from file")?
    } else if let Some(url) = &cli.database_url {
        url.clone()
    } else {
        anyhow::bail!("No database url provided")
    };

    let mut opt = ConnectOptions::new(db_url);

    if cli.log_level == "debug" {
        opt.sqlx_logging(true)
            .sqlx_logging_level(LevelFilter::Debug);
    } else {
        opt.sqlx_logging(false);
    }

    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8));

    let db = Database::connect(opt)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to run database migrations")?;
    recover_interrupted_builds(&db)
        .await
        .context("Failed to recover interrupted builds")?;
    Ok(db)
}

/// Builds left in a non-terminal state by a dead process are failed and
/// refunded at startup. CI-dispatched builds that already hold a run id
/// are exempt: the remote run may still finish, and the watchdog or the
/// callback will pick them up.
async fn recover_interrupted_builds(db: &DatabaseConnection) -> Result<()> {
    let builds = EBuild::find()
        .filter(
            Condition::any()
                .add(CBuild::Status.eq(BuildStatus::Pending))
                .add(CBuild::Status.eq(BuildStatus::Processing)),
        )
        .all(db)
        .await
        .context("Failed to query interrupted builds")?;

    for build in builds {
        if build.platform.is_remote_ci() && build.ci_run_id.is_some() {
            continue;
        }

        let owner = build.owner;
        let build_id = build.id;

        let mut abuild: ABuild = build.into();
        abuild.status = Set(BuildStatus::Failed);
        abuild.error_message = Set(Some("Build interrupted by server restart".to_string()));
        abuild.syncing_since = Set(None);
        abuild.updated_at = Set(Utc::now().naive_utc());
        abuild
            .update(db)
            .await
            .context("Failed to fail interrupted build")?;

        refund_daily_quota(db, owner, 1).await;
        info!(build_id = %build_id, "Failed and refunded interrupted build");
    }

    Ok(())
}

pub async fn get_build_for_owner(
    db: &DatabaseConnection,
    build_id: uuid::Uuid,
    owner: uuid::Uuid,
) -> Result<Option<MBuild>> {
    Ok(EBuild::find()
        .filter(
            Condition::all()
                .add(CBuild::Id.eq(build_id))
                .add(CBuild::Owner.eq(owner)),
        )
        .one(db)
        .await
        .context("Failed to query build")?)
}
