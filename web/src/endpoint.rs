/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use builder::expiry::apply_expiry_on_read;
use builder::github::{SyncOutcome, handle_ci_callback, sync_ci_build};
use builder::orchestrator::{PlatformConfig, submit_batch, submit_build};
use builder::watchdog::auto_sync_stuck_builds;
use chrono::{Duration, Utc};
use appcore::consts::SHARE_CODE_LENGTH;
use appcore::database::get_build_for_owner;
use appcore::storage::{
    DOWNLOAD_KIND_ARTIFACT, DOWNLOAD_KIND_SOURCE, temp_download_url, verify_download,
};
use appcore::types::*;
use entity::build::{BuildPlatform, BuildStatus};
use hmac::{Hmac, Mac};
use password_auth::{generate_hash, verify_password};
use rand::distributions::{Alphanumeric, DistString};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
};
use sha2::Sha256;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::error::{WebError, WebResult};
use super::requests::*;

type HmacSha256 = Hmac<Sha256>;

pub async fn handle_404() -> (StatusCode, Json<BaseResponse<String>>) {
    (
        StatusCode::NOT_FOUND,
        Json(BaseResponse {
            error: true,
            message: "Not Found".to_string(),
        }),
    )
}

pub async fn get_health() -> Json<BaseResponse<String>> {
    Json(BaseResponse {
        error: false,
        message: "200 ALIVE".to_string(),
    })
}

fn build_response(state: &Arc<ServerState>, build: MBuild) -> BuildResponse {
    let download_url = match (&build.status, &build.output_file_path) {
        (BuildStatus::Completed, Some(_)) => Some(temp_download_url(
            &state.cli.serve_url,
            &state.cli.sign_secret(),
            build.id,
            DOWNLOAD_KIND_ARTIFACT,
            state.cli.download_url_ttl,
        )),
        _ => None,
    };

    BuildResponse {
        id: build.id,
        platform: build.platform.to_string(),
        status: build.status.to_string(),
        progress: build.progress,
        app_name: build.app_name,
        package_id: build.package_id,
        version_name: build.version_name,
        url: build.url,
        error_message: build.error_message,
        output_file_path: build.output_file_path,
        download_url,
        icon_path: build.icon_path,
        ci_run_id: build.ci_run_id,
        expires_at: build.expires_at,
        created_at: build.created_at,
        updated_at: build.updated_at,
    }
}

fn platform_config(platform: BuildPlatform, url: String, body: MakeBuildRequest) -> PlatformConfig {
    PlatformConfig {
        platform,
        app_name: body.app_name,
        package_id: body.package_id,
        version_name: body.version_name,
        version_code: body.version_code,
        url,
        privacy_policy: body.privacy_policy,
        icon_path: body.icon_path,
        icon_url: body.icon_url,
        icon_data: body.icon_data,
    }
}

pub async fn post_build(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
    Path(platform): Path<String>,
    Json(body): Json<MakeBuildRequest>,
) -> WebResult<Json<BaseResponse<SubmitResponse>>> {
    let platform = BuildPlatform::from_str(&platform)
        .map_err(|_| WebError::BadRequest(format!("Unknown platform: {}", platform)))?;

    let url = body.url.clone();
    let config = platform_config(platform, url, body);

    let build_id = submit_build(&state, user.id, config).await?;

    Ok(Json(BaseResponse {
        error: false,
        message: SubmitResponse {
            build_id,
            status: BuildStatus::Pending.to_string(),
        },
    }))
}

pub async fn post_build_batch(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
    Json(body): Json<MakeBatchRequest>,
) -> WebResult<Json<BaseResponse<BatchSubmitResponse>>> {
    let mut configs = Vec::with_capacity(body.platforms.len());

    for platform_body in body.platforms {
        let platform = BuildPlatform::from_str(&platform_body.platform).map_err(|_| {
            WebError::BadRequest(format!("Unknown platform: {}", platform_body.platform))
        })?;

        configs.push(PlatformConfig {
            platform,
            app_name: platform_body.app_name,
            package_id: platform_body.package_id,
            version_name: platform_body.version_name,
            version_code: platform_body.version_code,
            url: body.url.clone(),
            privacy_policy: platform_body.privacy_policy,
            icon_path: platform_body.icon_path,
            icon_url: platform_body.icon_url,
            icon_data: platform_body.icon_data,
        });
    }

    let build_ids = submit_batch(&state, user.id, configs).await?;

    Ok(Json(BaseResponse {
        error: false,
        message: BatchSubmitResponse { build_ids },
    }))
}

pub async fn get_builds(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
) -> WebResult<Json<BaseResponse<Vec<BuildResponse>>>> {
    let builds = EBuild::find()
        .filter(CBuild::Owner.eq(user.id))
        .order_by_desc(CBuild::CreatedAt)
        .all(&state.db)
        .await?;

    let builds = apply_expiry_on_read(&state, builds);
    let builds = builds
        .into_iter()
        .map(|build| build_response(&state, build))
        .collect();

    Ok(Json(BaseResponse {
        error: false,
        message: builds,
    }))
}

pub async fn get_build(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
    Path(build_id): Path<Uuid>,
) -> WebResult<Json<BaseResponse<BuildResponse>>> {
    let build = get_build_for_owner(&state.db, build_id, user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Build"))?;

    let build = apply_expiry_on_read(&state, vec![build])
        .pop()
        .ok_or_else(|| WebError::not_found("Build"))?;

    Ok(Json(BaseResponse {
        error: false,
        message: build_response(&state, build),
    }))
}

/// Non-terminal builds only. Fires the stuck-build watchdog as a side
/// effect, detached from the response.
pub async fn get_build_polling(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
) -> WebResult<Json<BaseResponse<PollingResponse>>> {
    let builds = EBuild::find()
        .filter(
            Condition::all().add(CBuild::Owner.eq(user.id)).add(
                Condition::any()
                    .add(CBuild::Status.eq(BuildStatus::Pending))
                    .add(CBuild::Status.eq(BuildStatus::Processing)),
            ),
        )
        .order_by_desc(CBuild::CreatedAt)
        .all(&state.db)
        .await?;

    tokio::spawn(auto_sync_stuck_builds(Arc::clone(&state), user.id));

    let builds = builds
        .into_iter()
        .map(|build| PollingBuild {
            id: build.id,
            status: build.status.to_string(),
            progress: build.progress,
            platform: build.platform.to_string(),
            github_run_id: build.ci_run_id,
        })
        .collect();

    Ok(Json(BaseResponse {
        error: false,
        message: PollingResponse { builds },
    }))
}

pub async fn post_build_sync(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
    Path(build_id): Path<Uuid>,
) -> WebResult<Json<BaseResponse<SyncResponse>>> {
    let build = get_build_for_owner(&state.db, build_id, user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Build"))?;

    if !build.platform.is_remote_ci() {
        return Err(WebError::BadRequest(
            "Build platform is not CI-dispatched".to_string(),
        ));
    }

    let outcome = sync_ci_build(Arc::clone(&state), build)
        .await
        .map_err(|e| WebError::InternalServerError(format!("Sync failed: {}", e)))?;

    let signed_url = temp_download_url(
        &state.cli.serve_url,
        &state.cli.sign_secret(),
        build_id,
        DOWNLOAD_KIND_ARTIFACT,
        state.cli.download_url_ttl,
    );

    let response = match outcome {
        SyncOutcome::Completed { .. } | SyncOutcome::AlreadyDone => SyncResponse {
            success: true,
            status: BuildStatus::Completed.to_string(),
            download_url: Some(signed_url),
        },
        SyncOutcome::StillRunning => SyncResponse {
            success: true,
            status: "in_progress".to_string(),
            download_url: None,
        },
        SyncOutcome::Failed(_) => SyncResponse {
            success: false,
            status: BuildStatus::Failed.to_string(),
            download_url: None,
        },
    };

    Ok(Json(BaseResponse {
        error: false,
        message: response,
    }))
}

fn valid_callback_signature(secret: &str, payload: &[u8], headers: &HeaderMap) -> bool {
    if secret.is_empty() {
        tracing::warn!("Webhook secret not configured, skipping validation");
        return true;
    }

    let signature = match headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
    {
        Some(sig) => sig,
        None => return false,
    };

    let sig = signature.strip_prefix("sha256=").unwrap_or(signature);
    let sig_bytes = match hex::decode(sig) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(payload);

    mac.verify_slice(&sig_bytes).is_ok()
}

/// Push notification from the CI system. Authenticated by HMAC over the
/// raw body, not by a user session.
pub async fn post_github_callback(
    state: State<Arc<ServerState>>,
    Path(build_id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<Json<BaseResponse<CallbackResponse>>> {
    if !valid_callback_signature(&state.cli.github_webhook_secret(), &body, &headers) {
        return Err(WebError::invalid_signature());
    }

    let payload: CallbackRequest = serde_json::from_slice(&body)
        .map_err(|e| WebError::BadRequest(format!("Invalid callback payload: {}", e)))?;

    let build = EBuild::find_by_id(build_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| WebError::not_found("Build"))?;

    handle_ci_callback(
        Arc::clone(&state),
        build,
        &payload.status,
        payload.run_id,
        payload.artifact_url,
    )
    .await
    .map_err(|e| WebError::InternalServerError(format!("Callback handling failed: {}", e)))?;

    Ok(Json(BaseResponse {
        error: false,
        message: CallbackResponse {
            success: true,
            message: "Callback processed".to_string(),
        },
    }))
}

/// Signature-validated artifact download; the link itself is the
/// credential.
pub async fn get_download(
    state: State<Arc<ServerState>>,
    Path(build_id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> WebResult<Response> {
    let kind = query.kind.as_deref().unwrap_or(DOWNLOAD_KIND_ARTIFACT);

    if kind != DOWNLOAD_KIND_ARTIFACT && kind != DOWNLOAD_KIND_SOURCE {
        return Err(WebError::BadRequest(format!("Unknown download kind: {}", kind)));
    }

    if !verify_download(
        &state.cli.sign_secret(),
        build_id,
        kind,
        query.expires,
        &query.signature,
    ) {
        return Err(WebError::invalid_signature());
    }

    let build = EBuild::find_by_id(build_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| WebError::not_found("Build"))?;

    if build.expires_at <= Utc::now().naive_utc() {
        return Err(WebError::Gone("Build files expired".to_string()));
    }

    let object_path = match kind {
        DOWNLOAD_KIND_SOURCE => build.source_file_path.clone(),
        _ => build.output_file_path.clone(),
    };

    let object_path = object_path.ok_or_else(|| WebError::not_found("Artifact"))?;

    let data = state
        .store
        .download(&object_path)
        .await
        .map_err(|e| WebError::InternalServerError(format!("Artifact read failed: {}", e)))?;

    let file_name = object_path
        .rsplit('/')
        .next()
        .unwrap_or("artifact")
        .to_string();

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        data,
    )
        .into_response())
}

pub async fn post_share(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
    Path(build_id): Path<Uuid>,
    Json(body): Json<MakeShareRequest>,
) -> WebResult<Json<BaseResponse<ShareResponse>>> {
    let build = get_build_for_owner(&state.db, build_id, user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Build"))?;

    let now = Utc::now().naive_utc();

    if build.status != BuildStatus::Completed
        || build.output_file_path.is_none()
        || build.expires_at <= now
    {
        return Err(WebError::BadRequest(
            "Only completed, unexpired builds can be shared".to_string(),
        ));
    }

    let requested = now + Duration::days(body.expires_in_days.unwrap_or(7));
    let expires_at = requested.min(build.expires_at);

    let code = Alphanumeric.sample_string(&mut rand::thread_rng(), SHARE_CODE_LENGTH);

    let ashare = AShare {
        id: Set(Uuid::new_v4()),
        build: Set(build.id),
        code: Set(code.clone()),
        password_hash: Set(body.password.as_deref().map(generate_hash)),
        access_count: Set(0),
        expires_at: Set(expires_at),
        created_by: Set(user.id),
        created_at: Set(now),
    };

    ashare.insert(&state.db).await?;

    Ok(Json(BaseResponse {
        error: false,
        message: ShareResponse { code, expires_at },
    }))
}

pub async fn get_share(
    state: State<Arc<ServerState>>,
    Path(code): Path<String>,
    Query(query): Query<ShareResolveQuery>,
) -> WebResult<Json<BaseResponse<ShareResolveResponse>>> {
    let share = EShare::find()
        .filter(CShare::Code.eq(code))
        .one(&state.db)
        .await?
        .ok_or_else(|| WebError::not_found("Share"))?;

    let now = Utc::now().naive_utc();

    if share.expires_at <= now {
        return Err(WebError::Gone("Share link expired".to_string()));
    }

    if let Some(hash) = &share.password_hash {
        let password = query
            .password
            .as_deref()
            .ok_or_else(|| WebError::Unauthorized("Password required".to_string()))?;

        if verify_password(password, hash).is_err() {
            return Err(WebError::Unauthorized("Invalid password".to_string()));
        }
    }

    let build = EBuild::find_by_id(share.build)
        .one(&state.db)
        .await?
        .ok_or_else(|| WebError::not_found("Build"))?;

    if build.expires_at <= now || build.output_file_path.is_none() {
        return Err(WebError::Gone("Build files expired".to_string()));
    }

    let access_count = share.access_count + 1;
    let mut ashare: AShare = share.into();
    ashare.access_count = Set(access_count);
    ashare.update(&state.db).await?;

    Ok(Json(BaseResponse {
        error: false,
        message: ShareResolveResponse {
            app_name: build.app_name.clone(),
            platform: build.platform.to_string(),
            download_url: temp_download_url(
                &state.cli.serve_url,
                &state.cli.sign_secret(),
                build.id,
                DOWNLOAD_KIND_ARTIFACT,
                state.cli.download_url_ttl,
            ),
            access_count,
        },
    }))
}
