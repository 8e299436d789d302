/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Retention handling. Expiry is applied lazily on every read: the
//! response sees nulled file pointers immediately while object deletion
//! runs in the background. A slow periodic sweep covers builds whose
//! owners never poll again.

use chrono::Utc;
use appcore::types::*;
use entity::build::BuildStatus;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

const CLEANUP_TICK_SECS: u64 = 60;
// Run the full sweep every hour (60 * 60 second ticks).
const CLEANUP_INTERVAL: u32 = 60;

fn has_files(build: &MBuild) -> bool {
    build.output_file_path.is_some()
        || build.icon_path.is_some()
        || build.source_file_path.is_some()
}

pub fn is_expired(build: &MBuild, now: chrono::NaiveDateTime) -> bool {
    build.expires_at <= now
}

/// Applied to every build list/detail read. Expired records come back
/// with their file pointers already nulled, without waiting for the
/// background deletion to finish.
pub fn apply_expiry_on_read(state: &Arc<ServerState>, builds: Vec<MBuild>) -> Vec<MBuild> {
    let now = Utc::now().naive_utc();

    builds
        .into_iter()
        .map(|mut build| {
            if is_expired(&build, now) && has_files(&build) {
                let state = Arc::clone(state);
                let record = build.clone();
                tokio::spawn(async move {
                    purge_build_files(state, record).await;
                });

                build.output_file_path = None;
                build.icon_path = None;
                build.source_file_path = None;
            }
            build
        })
        .collect()
}

/// Deletes a build's storage objects and nulls its file pointers.
/// Object deletion failures are logged and the pointers kept so a later
/// sweep retries.
pub async fn purge_build_files(state: Arc<ServerState>, build: MBuild) {
    let paths: Vec<String> = [
        build.output_file_path.clone(),
        build.icon_path.clone(),
        build.source_file_path.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();

    for path in &paths {
        if let Err(e) = state.store.delete(path).await {
            warn!(error = %e, build_id = %build.id, path = %path, "Failed to delete expired object");
            return;
        }
    }

    let current = match EBuild::find_by_id(build.id).one(&state.db).await {
        Ok(Some(current)) => current,
        Ok(None) => return,
        Err(e) => {
            error!(error = %e, build_id = %build.id, "Failed to load build for expiry");
            return;
        }
    };

    let mut abuild: ABuild = current.into();
    abuild.output_file_path = Set(None);
    abuild.icon_path = Set(None);
    abuild.source_file_path = Set(None);
    abuild.updated_at = Set(Utc::now().naive_utc());

    if let Err(e) = abuild.update(&state.db).await {
        error!(error = %e, build_id = %build.id, "Failed to clear expired file pointers");
    } else {
        info!(build_id = %build.id, objects = paths.len(), "Purged expired build files");
    }
}

/// Sweeps all terminal builds past their retention window.
pub async fn purge_expired_builds(state: Arc<ServerState>) {
    let now = Utc::now().naive_utc();

    let expired = match EBuild::find()
        .filter(
            Condition::all()
                .add(CBuild::ExpiresAt.lte(now))
                .add(
                    Condition::any()
                        .add(CBuild::Status.eq(BuildStatus::Completed))
                        .add(CBuild::Status.eq(BuildStatus::Failed)),
                )
                .add(
                    Condition::any()
                        .add(CBuild::OutputFilePath.is_not_null())
                        .add(CBuild::IconPath.is_not_null())
                        .add(CBuild::SourceFilePath.is_not_null()),
                ),
        )
        .all(&state.db)
        .await
    {
        Ok(expired) => expired,
        Err(e) => {
            error!(error = %e, "Failed to query expired builds");
            return;
        }
    };

    if expired.is_empty() {
        return;
    }

    info!(count = expired.len(), "Purging expired builds");

    for build in expired {
        purge_build_files(Arc::clone(&state), build).await;
    }
}

pub async fn expiry_loop(state: Arc<ServerState>) {
    let _guard = if state.cli.report_errors {
        Some(sentry::init(
            "https://5895e5a5d35f4dbebbcc47d5a722c402@reports.wavelens.io/1",
        ))
    } else {
        None
    };

    let mut interval = time::interval(Duration::from_secs(CLEANUP_TICK_SECS));
    let mut cleanup_counter = 0;

    loop {
        interval.tick().await;

        cleanup_counter += 1;
        if cleanup_counter >= CLEANUP_INTERVAL {
            cleanup_counter = 0;
            purge_expired_builds(Arc::clone(&state)).await;
        }
    }
}
