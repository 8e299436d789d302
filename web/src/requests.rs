/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_version_name() -> String {
    "1.0.0".to_string()
}

fn default_version_code() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeBuildRequest {
    pub app_name: String,
    pub package_id: Option<String>,
    #[serde(default = "default_version_name")]
    pub version_name: String,
    #[serde(default = "default_version_code")]
    pub version_code: i32,
    pub url: String,
    pub privacy_policy: Option<String>,
    pub icon_path: Option<String>,
    pub icon_url: Option<String>,
    pub icon_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPlatformRequest {
    pub platform: String,
    pub app_name: String,
    pub package_id: Option<String>,
    #[serde(default = "default_version_name")]
    pub version_name: String,
    #[serde(default = "default_version_code")]
    pub version_code: i32,
    pub privacy_policy: Option<String>,
    pub icon_path: Option<String>,
    pub icon_url: Option<String>,
    pub icon_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeBatchRequest {
    pub url: String,
    pub platforms: Vec<BatchPlatformRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub build_id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSubmitResponse {
    pub build_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildResponse {
    pub id: Uuid,
    pub platform: String,
    pub status: String,
    pub progress: i32,
    pub app_name: String,
    pub package_id: String,
    pub version_name: String,
    pub url: String,
    pub error_message: Option<String>,
    pub output_file_path: Option<String>,
    pub download_url: Option<String>,
    pub icon_path: Option<String>,
    pub ci_run_id: Option<i64>,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollingBuild {
    pub id: Uuid,
    pub status: String,
    pub progress: i32,
    pub platform: String,
    pub github_run_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollingResponse {
    pub builds: Vec<PollingBuild>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub status: String,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackRequest {
    pub status: String,
    pub run_id: i64,
    pub artifact_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub kind: Option<String>,
    pub expires: i64,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeShareRequest {
    pub password: Option<String>,
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub code: String,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ShareResolveQuery {
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResolveResponse {
    pub app_name: String,
    pub platform: String,
    pub download_url: String,
    pub access_count: i32,
}
