/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use chrono::Utc;
use appcore::consts::*;
use appcore::quota::refund_daily_quota;
use appcore::storage::{DOWNLOAD_KIND_SOURCE, build_object_path, temp_download_url};
use appcore::types::*;
use entity::build::BuildStatus;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, instrument, warn};

use super::assembly::{AssemblyService, TemplateAssembler};

pub async fn schedule_build_loop(state: Arc<ServerState>) {
    let _guard = if state.cli.report_errors {
        Some(sentry::init(
            "https://5895e5a5d35f4dbebbcc47d5a722c402@reports.wavelens.io/1",
        ))
    } else {
        None
    };

    let mut current_schedules = vec![];
    let mut interval = time::interval(Duration::from_secs(2));

    info!("Build scheduler loop started");

    loop {
        let mut added_schedule = false;
        current_schedules.retain(|schedule: &JoinHandle<()>| !schedule.is_finished());

        while current_schedules.len() < state.cli.max_concurrent_builds {
            let build = match claim_next_build(Arc::clone(&state)).await {
                Some(build) => build,
                None => break,
            };

            debug!(build_id = %build.id, platform = %build.platform, "Claimed build from queue");
            let schedule = tokio::spawn(process_build(Arc::clone(&state), build));
            current_schedules.push(schedule);
            added_schedule = true;
        }

        if !added_schedule {
            interval.tick().await;
        }
    }
}

/// Oldest pending build, claimed by a conditional `Pending → Processing`
/// transition so concurrent instances never pick up the same record.
async fn claim_next_build(state: Arc<ServerState>) -> Option<MBuild> {
    let build = match EBuild::find()
        .filter(CBuild::Status.eq(BuildStatus::Pending))
        .order_by_asc(CBuild::CreatedAt)
        .one(&state.db)
        .await
    {
        Ok(Some(build)) => build,
        Ok(None) => return None,
        Err(e) => {
            error!(error = %e, "Failed to query pending builds");
            return None;
        }
    };

    let claim = EBuild::update_many()
        .col_expr(CBuild::Status, Expr::value(BuildStatus::Processing))
        .col_expr(CBuild::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(
            Condition::all()
                .add(CBuild::Id.eq(build.id))
                .add(CBuild::Status.eq(BuildStatus::Pending)),
        )
        .exec(&state.db)
        .await;

    match claim {
        Ok(res) if res.rows_affected == 1 => EBuild::find_by_id(build.id)
            .one(&state.db)
            .await
            .ok()
            .flatten(),
        Ok(_) => None,
        Err(e) => {
            error!(error = %e, "Failed to claim build");
            None
        }
    }
}

#[instrument(skip(state), fields(build_id = %build.id, platform = %build.platform))]
pub async fn process_build(state: Arc<ServerState>, build: MBuild) {
    info!("Processing build");

    let assembler = TemplateAssembler::new(&state.cli.template_path);

    let result = if build.platform.is_remote_ci() {
        dispatch_ci_build(Arc::clone(&state), &assembler, &build).await
    } else {
        run_local_build(Arc::clone(&state), &assembler, &build).await
    };

    if let Err(e) = result {
        error!(error = %e, "Build processing failed");
        fail_build(Arc::clone(&state), build, format!("{:#}", e)).await;
    }
}

/// In-process pipeline: assemble the package, upload it, finish.
pub async fn run_local_build(
    state: Arc<ServerState>,
    assembler: &dyn AssemblyService,
    build: &MBuild,
) -> Result<()> {
    update_build_progress(Arc::clone(&state), build.id, 10).await;

    let icon = load_icon(&state, build).await;
    update_build_progress(Arc::clone(&state), build.id, 30).await;

    let artifact = assembler
        .assemble(build, icon.as_deref())
        .await
        .context("Artifact assembly failed")?;
    update_build_progress(Arc::clone(&state), build.id, 70).await;

    let output_path = build_object_path(build.id, &artifact.file_name);
    state
        .store
        .upload(&output_path, &artifact.data)
        .await
        .context("Artifact upload failed")?;

    complete_build(state, build.id, output_path).await;
    Ok(())
}

/// Stage 1 of the APK pipeline: assemble the source bundle in-process,
/// hand it to the CI system, and park the build at the dispatch progress
/// mark. Stage 2 (callback, manual sync, or watchdog) finishes it.
pub async fn dispatch_ci_build(
    state: Arc<ServerState>,
    assembler: &dyn AssemblyService,
    build: &MBuild,
) -> Result<()> {
    update_build_progress(Arc::clone(&state), build.id, 10).await;

    let icon = load_icon(&state, build).await;

    let bundle = assembler
        .assemble(build, icon.as_deref())
        .await
        .context("Source bundle assembly failed")?;

    let source_path = build_object_path(build.id, SOURCE_BUNDLE_NAME);
    state
        .store
        .upload(&source_path, &bundle.data)
        .await
        .context("Source bundle upload failed")?;

    let mut abuild: ABuild = build.clone().into();
    abuild.source_file_path = Set(Some(source_path));
    abuild.progress = Set(30);
    abuild.updated_at = Set(Utc::now().naive_utc());
    abuild
        .update(&state.db)
        .await
        .context("Failed to record source bundle")?;

    let source_url = temp_download_url(
        &state.cli.serve_url,
        &state.cli.sign_secret(),
        build.id,
        DOWNLOAD_KIND_SOURCE,
        state.cli.download_url_ttl,
    );

    state
        .github
        .dispatch_workflow(build.id, &source_url)
        .await
        .context("CI dispatch failed")?;

    update_build_progress(Arc::clone(&state), build.id, CI_DISPATCHED_PROGRESS).await;
    info!("Dispatched build to CI");
    Ok(())
}

/// The icon is optional everywhere: a missing or failing icon downgrades
/// the build to the template default instead of failing it.
async fn load_icon(state: &Arc<ServerState>, build: &MBuild) -> Option<Vec<u8>> {
    if let Some(path) = &build.icon_path {
        match state.store.download(path).await {
            Ok(data) => return Some(data),
            Err(e) => {
                warn!(error = %e, "Failed to load uploaded icon, continuing without it");
                return None;
            }
        }
    }

    if let Some(url) = &build.icon_url {
        return fetch_remote_icon(&state.http, url).await;
    }

    None
}

/// Remote icons get one attempt per timeout step; slow origins are given
/// progressively more room before the build moves on without an icon.
async fn fetch_remote_icon(http: &reqwest::Client, url: &str) -> Option<Vec<u8>> {
    for (attempt, timeout) in ICON_FETCH_TIMEOUTS.iter().enumerate() {
        let response = http
            .get(url)
            .timeout(Duration::from_secs(*timeout))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => return Some(bytes.to_vec()),
                Err(e) => {
                    warn!(error = %e, attempt = attempt + 1, "Failed to read icon body")
                }
            },
            Ok(resp) => {
                warn!(status = %resp.status(), attempt = attempt + 1, "Icon fetch rejected")
            }
            Err(e) => warn!(error = %e, attempt = attempt + 1, "Icon fetch failed"),
        }
    }

    warn!(url = %url, "Giving up on remote icon, continuing without it");
    None
}

pub async fn update_build_progress(state: Arc<ServerState>, build_id: uuid::Uuid, progress: i32) {
    let update = EBuild::update_many()
        .col_expr(CBuild::Progress, Expr::value(progress))
        .col_expr(CBuild::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(
            Condition::all()
                .add(CBuild::Id.eq(build_id))
                .add(CBuild::Status.eq(BuildStatus::Processing)),
        )
        .exec(&state.db)
        .await;

    if let Err(e) = update {
        error!(error = %e, build_id = %build_id, "Failed to update build progress");
    }
}

/// Terminal success transition. Completed is absorbing: a record that
/// already reached a terminal state is left untouched.
pub async fn complete_build(state: Arc<ServerState>, build_id: uuid::Uuid, output_path: String) {
    let build = match EBuild::find_by_id(build_id).one(&state.db).await {
        Ok(Some(build)) => build,
        Ok(None) => {
            error!(build_id = %build_id, "Build vanished before completion");
            return;
        }
        Err(e) => {
            error!(error = %e, build_id = %build_id, "Failed to load build for completion");
            return;
        }
    };

    if build.status.is_terminal() {
        debug!(build_id = %build_id, "Build already terminal, skipping completion");
        return;
    }

    let mut abuild: ABuild = build.into();
    abuild.status = Set(BuildStatus::Completed);
    abuild.progress = Set(100);
    abuild.output_file_path = Set(Some(output_path));
    abuild.error_message = Set(None);
    abuild.syncing_since = Set(None);
    abuild.updated_at = Set(Utc::now().naive_utc());

    match abuild.update(&state.db).await {
        Ok(updated) => info!(build_id = %updated.id, "Build completed"),
        Err(e) => error!(error = %e, build_id = %build_id, "Failed to mark build completed"),
    }
}

/// Terminal failure transition plus the matching quota refund. The
/// refund happens exactly once: only the transition from a non-terminal
/// state pays out, so repeated failure-path invocations are no-ops.
/// Returns whether a refund was issued.
pub async fn fail_build(state: Arc<ServerState>, build: MBuild, message: String) -> bool {
    let current = match EBuild::find_by_id(build.id).one(&state.db).await {
        Ok(Some(current)) => current,
        Ok(None) => {
            error!(build_id = %build.id, "Build vanished before failure handling");
            return false;
        }
        Err(e) => {
            error!(error = %e, build_id = %build.id, "Failed to load build for failure handling");
            return false;
        }
    };

    if current.status.is_terminal() {
        debug!(build_id = %current.id, "Build already terminal, skipping failure transition");
        return false;
    }

    let owner = current.owner;
    let build_id = current.id;

    let mut abuild: ABuild = current.into();
    abuild.status = Set(BuildStatus::Failed);
    abuild.error_message = Set(Some(message));
    abuild.syncing_since = Set(None);
    abuild.updated_at = Set(Utc::now().naive_utc());

    if let Err(e) = abuild.update(&state.db).await {
        error!(error = %e, build_id = %build_id, "Failed to mark build failed");
        return false;
    }

    refund_daily_quota(&state.db, owner, 1).await;
    info!(build_id = %build_id, "Build failed, quota refunded");
    true
}
