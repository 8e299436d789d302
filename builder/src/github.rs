/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Stage 2 of the CI-dispatched pipeline: poll the remote run, retrieve
//! and unpack the compiled artifact, republish it as the user-facing
//! output, and clean up the stage-1 source bundle.

use anyhow::{Context, Result};
use chrono::Utc;
use appcore::consts::*;
use appcore::github::{RunStatus, extract_nested_apk};
use appcore::storage::build_object_path;
use appcore::types::*;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::assembly::sanitize_file_name;
use super::scheduler::{complete_build, fail_build};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The final APK is already in place; nothing was downloaded again.
    AlreadyDone,
    StillRunning,
    Completed { output_path: String },
    Failed(String),
}

/// Drives one CI-dispatched build towards its terminal state.
///
/// Terminal CI outcomes (success, failure, unusable artifact) update the
/// record here; transient problems (network, CI API) surface as `Err`
/// and leave the record untouched so a later cycle can retry.
#[instrument(skip(state, build), fields(build_id = %build.id))]
pub async fn sync_ci_build(state: Arc<ServerState>, build: MBuild) -> Result<SyncOutcome> {
    // Duplicate callbacks and poll/callback races land here; an output
    // path already carrying the final extension means all work is done.
    if build
        .output_file_path
        .as_deref()
        .is_some_and(|p| p.ends_with(APK_EXTENSION))
    {
        debug!("Output already present, skipping sync");
        return Ok(SyncOutcome::AlreadyDone);
    }

    let run_id = match build.ci_run_id {
        Some(run_id) => run_id,
        None => match recover_run_id(&state, &build).await? {
            Some(run_id) => run_id,
            None => anyhow::bail!("No CI run associated with build"),
        },
    };

    let run = state
        .github
        .get_run(run_id)
        .await
        .context("Failed to query CI run status")?;

    match run.status {
        RunStatus::Queued | RunStatus::InProgress => Ok(SyncOutcome::StillRunning),
        RunStatus::Completed if run.succeeded() => {
            finalize_ci_build(state, build, run_id).await
        }
        RunStatus::Completed => {
            let message = "CI build failed".to_string();
            fail_build(state, build, message.clone()).await;
            Ok(SyncOutcome::Failed(message))
        }
    }
}

async fn finalize_ci_build(
    state: Arc<ServerState>,
    build: MBuild,
    run_id: i64,
) -> Result<SyncOutcome> {
    let archive = state
        .github
        .download_artifact(run_id, APK_ARTIFACT_NAME)
        .await
        .context("Failed to download CI artifact")?;

    let archive = match archive {
        Some(archive) => archive,
        None => {
            let message = "CI artifact not found".to_string();
            fail_build(state, build, message.clone()).await;
            return Ok(SyncOutcome::Failed(message));
        }
    };

    let apk = match extract_nested_apk(&archive) {
        Ok(apk) => apk,
        Err(e) => {
            let message = format!("{}", e);
            fail_build(state, build, message.clone()).await;
            return Ok(SyncOutcome::Failed(message));
        }
    };

    let output_path = build_object_path(
        build.id,
        &format!("{}{}", sanitize_file_name(&build.app_name), APK_EXTENSION),
    );

    state
        .store
        .upload(&output_path, &apk)
        .await
        .context("Failed to upload compiled APK")?;

    complete_build(Arc::clone(&state), build.id, output_path.clone()).await;
    cleanup_source_artifact(state, &build).await;

    Ok(SyncOutcome::Completed { output_path })
}

/// The stage-1 source bundle is transient; once the final APK is in
/// place it is deleted. Best-effort by contract: a cleanup failure is
/// logged and never fails the parent operation.
async fn cleanup_source_artifact(state: Arc<ServerState>, build: &MBuild) {
    let source_path = match &build.source_file_path {
        Some(path) => path.clone(),
        None => return,
    };

    if let Err(e) = state.store.delete(&source_path).await {
        warn!(error = %e, build_id = %build.id, "Failed to delete source bundle");
        return;
    }

    let current = match EBuild::find_by_id(build.id).one(&state.db).await {
        Ok(Some(current)) => current,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, build_id = %build.id, "Failed to load build for source cleanup");
            return;
        }
    };

    let mut abuild: ABuild = current.into();
    abuild.source_file_path = Set(None);
    abuild.updated_at = Set(Utc::now().naive_utc());

    if let Err(e) = abuild.update(&state.db).await {
        warn!(error = %e, build_id = %build.id, "Failed to clear source bundle reference");
    }
}

/// Heuristic reconciliation for a build that lost its run id (crash
/// before the id was persisted): adopt the most recent successful run
/// of the workflow. Not a guaranteed match; the dispatch inputs carry
/// the build id so a mis-association can be audited on the CI side.
pub async fn recover_run_id(state: &Arc<ServerState>, build: &MBuild) -> Result<Option<i64>> {
    warn!(build_id = %build.id, "Recovering lost CI run association");

    let runs = state
        .github
        .list_recent_runs(10)
        .await
        .context("Failed to list recent CI runs")?;

    let run = match runs.into_iter().find(|run| run.succeeded()) {
        Some(run) => run,
        None => return Ok(None),
    };

    let mut abuild: ABuild = build.clone().into();
    abuild.ci_run_id = Set(Some(run.id));
    abuild.updated_at = Set(Utc::now().naive_utc());
    abuild
        .update(&state.db)
        .await
        .context("Failed to persist recovered run id")?;

    info!(build_id = %build.id, run_id = run.id, "Re-associated build with CI run");
    Ok(Some(run.id))
}

/// Push-path from the CI system. Persists the run linkage immediately
/// and kicks off the artifact retrieval without waiting for the next
/// poll cycle.
pub async fn handle_ci_callback(
    state: Arc<ServerState>,
    build: MBuild,
    status: &str,
    run_id: i64,
    artifact_url: Option<String>,
) -> Result<()> {
    let mut abuild: ABuild = build.clone().into();
    abuild.ci_run_id = Set(Some(run_id));
    abuild.ci_artifact_url = Set(artifact_url);
    abuild.updated_at = Set(Utc::now().naive_utc());
    let build = abuild
        .update(&state.db)
        .await
        .context("Failed to persist CI callback")?;

    if status == "success" {
        tokio::spawn(async move {
            if let Err(e) = sync_ci_build(Arc::clone(&state), build).await {
                error!(error = %e, "Callback-triggered sync failed");
            }
        });
    } else {
        fail_build(state, build, "CI build failed".to_string()).await;
    }

    Ok(())
}
