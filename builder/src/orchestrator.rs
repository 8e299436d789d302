/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Submission path: validate, charge quota, persist pending records.
//! Validation happens strictly before any deduction so a request that
//! can never succeed is free; every consumed unit whose record cannot
//! be created is refunded on the spot, keeping partial batches alive.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Duration, Utc};
use appcore::input::{valid_package_identifier, valid_target_url, valid_version_name};
use appcore::quota::{check_daily_quota, consume_daily_quota, refund_daily_quota, retention_days};
use appcore::storage::build_object_path;
use appcore::types::*;
use entity::build::{BuildPlatform, BuildStatus};
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::Set;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub platform: BuildPlatform,
    pub app_name: String,
    pub package_id: Option<String>,
    pub version_name: String,
    pub version_code: i32,
    pub url: String,
    pub privacy_policy: Option<String>,
    /// Pre-uploaded storage reference.
    pub icon_path: Option<String>,
    /// Remote origin, fetched during processing.
    pub icon_url: Option<String>,
    /// Inline base64 bytes (legacy path), validated at submission.
    pub icon_data: Option<String>,
}

#[derive(Debug)]
pub enum SubmitError {
    Validation(String),
    QuotaExceeded { remaining: i32, limit: i32 },
    Infra(String),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Validation(msg) => write!(f, "{}", msg),
            SubmitError::QuotaExceeded { remaining, limit } => write!(
                f,
                "Daily build quota exceeded ({} of {} remaining)",
                remaining, limit
            ),
            SubmitError::Infra(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Single-platform submission.
pub async fn submit_build(
    state: &Arc<ServerState>,
    user_id: Uuid,
    config: PlatformConfig,
) -> Result<Uuid, SubmitError> {
    let ids = submit_batch(state, user_id, vec![config]).await?;
    Ok(ids[0])
}

/// Batch submission. Quota is checked and deducted for the exact
/// platform count before any record exists; record creation failures
/// refund per unit and do not cancel sibling platforms.
pub async fn submit_batch(
    state: &Arc<ServerState>,
    user_id: Uuid,
    configs: Vec<PlatformConfig>,
) -> Result<Vec<Uuid>, SubmitError> {
    if configs.is_empty() {
        return Err(SubmitError::Validation("No platforms requested".to_string()));
    }

    let mut icons = Vec::with_capacity(configs.len());
    for config in &configs {
        icons.push(validate_config(state, config)?);
    }

    let count = configs.len() as i32;
    let check = check_daily_quota(&state.db, user_id, count)
        .await
        .map_err(|e| SubmitError::Infra(format!("Quota check failed: {}", e)))?;

    if !check.allowed {
        return Err(SubmitError::QuotaExceeded {
            remaining: check.remaining,
            limit: check.limit,
        });
    }

    let retention = retention_days(&state.db, user_id)
        .await
        .map_err(|e| SubmitError::Infra(format!("Failed to resolve retention window: {}", e)))?;

    let consumed = consume_daily_quota(&state.db, user_id, count)
        .await
        .map_err(|e| SubmitError::Infra(format!("Quota deduction failed: {}", e)))?;

    if !consumed {
        // Lost a race against a concurrent submission.
        return Err(SubmitError::QuotaExceeded {
            remaining: check.remaining,
            limit: check.limit,
        });
    }

    let now = Utc::now().naive_utc();
    let expires_at = now + Duration::days(retention as i64);

    let mut build_ids = Vec::new();
    for (config, icon) in configs.into_iter().zip(icons.into_iter()) {
        let build_id = Uuid::new_v4();

        let abuild = ABuild {
            id: Set(build_id),
            owner: Set(user_id),
            platform: Set(config.platform),
            status: Set(BuildStatus::Pending),
            progress: Set(0),
            app_name: Set(config.app_name.trim().to_string()),
            package_id: Set(config.package_id.unwrap_or_default().to_lowercase()),
            version_name: Set(config.version_name),
            version_code: Set(config.version_code),
            url: Set(config.url),
            privacy_policy: Set(config.privacy_policy),
            icon_path: Set(None),
            icon_url: Set(config.icon_url),
            error_message: Set(None),
            output_file_path: Set(None),
            source_file_path: Set(None),
            ci_run_id: Set(None),
            ci_artifact_url: Set(None),
            syncing_since: Set(None),
            expires_at: Set(expires_at),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match abuild.insert(&state.db).await {
            Ok(build) => {
                upload_inline_icon(state, &build, config.icon_path, icon).await;
                info!(build_id = %build.id, platform = %build.platform, "Build record created");
                build_ids.push(build.id);
            }
            Err(e) => {
                error!(error = %e, platform = %config.platform, "Failed to create build record");
                refund_daily_quota(&state.db, user_id, 1).await;
            }
        }
    }

    if build_ids.is_empty() {
        return Err(SubmitError::Infra(
            "Failed to create build records".to_string(),
        ));
    }

    Ok(build_ids)
}

/// Inline icon bytes are stored next to the build at submission time;
/// a pre-uploaded reference is adopted as-is. Both are best-effort: the
/// build proceeds without a custom icon on failure.
async fn upload_inline_icon(
    state: &Arc<ServerState>,
    build: &MBuild,
    icon_path: Option<String>,
    icon: Option<Vec<u8>>,
) {
    let stored_path = if let Some(data) = icon {
        let path = build_object_path(build.id, "icon.png");
        match state.store.upload(&path, &data).await {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!(error = %e, build_id = %build.id, "Icon upload failed, continuing without icon");
                None
            }
        }
    } else {
        icon_path
    };

    let Some(stored_path) = stored_path else {
        return;
    };

    let mut abuild: ABuild = build.clone().into();
    abuild.icon_path = Set(Some(stored_path));
    abuild.updated_at = Set(Utc::now().naive_utc());

    if let Err(e) = abuild.update(&state.db).await {
        warn!(error = %e, build_id = %build.id, "Failed to record icon reference");
    }
}

/// All rejections here happen before the quota deduction.
fn validate_config(
    state: &Arc<ServerState>,
    config: &PlatformConfig,
) -> Result<Option<Vec<u8>>, SubmitError> {
    if config.app_name.trim().is_empty() {
        return Err(SubmitError::Validation("App name cannot be empty".to_string()));
    }

    if !valid_target_url(&config.url) {
        return Err(SubmitError::Validation(format!(
            "Invalid target URL: {}",
            config.url
        )));
    }

    if !valid_version_name(&config.version_name) {
        return Err(SubmitError::Validation(format!(
            "Invalid version name: {}",
            config.version_name
        )));
    }

    if config.platform.requires_package_id() {
        let valid = config
            .package_id
            .as_deref()
            .map(|p| valid_package_identifier(&p.to_lowercase()))
            .unwrap_or(false);

        if !valid {
            return Err(SubmitError::Validation(format!(
                "Invalid package identifier for platform {}",
                config.platform
            )));
        }
    }

    let icon = match &config.icon_data {
        Some(data) => Some(BASE64.decode(data).map_err(|_| {
            SubmitError::Validation("Invalid inline icon encoding".to_string())
        })?),
        None => None,
    };

    if let Some(icon) = &icon {
        if icon.len() > state.cli.icon_max_bytes {
            return Err(SubmitError::Validation(format!(
                "Icon exceeds maximum size of {} bytes",
                state.cli.icon_max_bytes
            )));
        }
    }

    Ok(icon)
}
