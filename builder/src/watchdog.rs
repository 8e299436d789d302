/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Opportunistic resync of CI-dispatched builds that stopped making
//! progress. Runs as a side effect of the polling endpoint; there is no
//! separate scheduler process. Coordination across server instances
//! uses a claim timestamp on the build row itself, conditionally set and
//! cleared, with a staleness window instead of an in-process lock set.

use chrono::{Duration, Utc};
use appcore::consts::CI_DISPATCHED_PROGRESS;
use appcore::types::*;
use entity::build::{BuildPlatform, BuildStatus};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::github::sync_ci_build;

/// Finds the caller's stuck CI builds and resyncs each one it manages
/// to claim. A build counts as stuck when it has been parked at the
/// dispatch progress mark longer than the configured threshold without
/// producing an output file.
pub async fn auto_sync_stuck_builds(state: Arc<ServerState>, owner: Uuid) {
    let threshold = Utc::now().naive_utc() - Duration::seconds(state.cli.stuck_after_secs);

    let stuck = match EBuild::find()
        .filter(
            Condition::all()
                .add(CBuild::Owner.eq(owner))
                .add(CBuild::Platform.eq(BuildPlatform::AndroidApk))
                .add(CBuild::Status.eq(BuildStatus::Processing))
                .add(CBuild::Progress.eq(CI_DISPATCHED_PROGRESS))
                .add(CBuild::OutputFilePath.is_null())
                .add(CBuild::UpdatedAt.lte(threshold)),
        )
        .all(&state.db)
        .await
    {
        Ok(stuck) => stuck,
        Err(e) => {
            error!(error = %e, "Failed to query stuck builds");
            return;
        }
    };

    if stuck.is_empty() {
        return;
    }

    info!(count = stuck.len(), "Resyncing stuck CI builds");

    for build in stuck {
        if !claim_sync(&state, build.id).await {
            debug!(build_id = %build.id, "Sync already claimed elsewhere, skipping");
            continue;
        }

        match sync_ci_build(Arc::clone(&state), build.clone()).await {
            Ok(outcome) => {
                debug!(build_id = %build.id, ?outcome, "Watchdog sync finished");
                release_sync(&state, build.id).await;
            }
            Err(e) => {
                // Transient failure: the claim is retained on purpose.
                // The staleness window reopens the build for retry
                // instead of hammering the CI API every poll.
                warn!(error = %e, build_id = %build.id, "Watchdog sync hit transient error, claim retained");
            }
        }
    }
}

/// Conditional claim: only one instance wins; stale claims (owner died
/// mid-sync) are taken over after the staleness window.
async fn claim_sync(state: &Arc<ServerState>, build_id: Uuid) -> bool {
    let stale =
        Utc::now().naive_utc() - Duration::seconds(state.cli.sync_claim_stale_secs);

    let claim = EBuild::update_many()
        .col_expr(CBuild::SyncingSince, Expr::value(Utc::now().naive_utc()))
        .filter(
            Condition::all()
                .add(CBuild::Id.eq(build_id))
                .add(CBuild::Status.eq(BuildStatus::Processing))
                .add(
                    Condition::any()
                        .add(CBuild::SyncingSince.is_null())
                        .add(CBuild::SyncingSince.lt(stale)),
                ),
        )
        .exec(&state.db)
        .await;

    match claim {
        Ok(res) => res.rows_affected == 1,
        Err(e) => {
            error!(error = %e, build_id = %build_id, "Failed to claim build for sync");
            false
        }
    }
}

async fn release_sync(state: &Arc<ServerState>, build_id: Uuid) {
    let release = EBuild::update_many()
        .col_expr(CBuild::SyncingSince, Expr::value(None::<chrono::NaiveDateTime>))
        .filter(CBuild::Id.eq(build_id))
        .exec(&state.db)
        .await;

    if let Err(e) = release {
        error!(error = %e, build_id = %build_id, "Failed to release sync claim");
    }
}
