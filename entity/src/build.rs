/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeriveActiveEnum, EnumIter, Deserialize, Serialize)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
pub enum BuildStatus {
    #[sea_orm(num_value = 0)]
    Pending,
    #[sea_orm(num_value = 1)]
    Processing,
    #[sea_orm(num_value = 2)]
    Completed,
    #[sea_orm(num_value = 3)]
    Failed,
}

impl BuildStatus {
    /// Completed and Failed are absorbing states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Completed | BuildStatus::Failed)
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildStatus::Pending => "pending",
            BuildStatus::Processing => "processing",
            BuildStatus::Completed => "completed",
            BuildStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeriveActiveEnum, EnumIter, Deserialize, Serialize)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
pub enum BuildPlatform {
    #[sea_orm(num_value = 0)]
    Android,
    #[sea_orm(num_value = 1)]
    AndroidApk,
    #[sea_orm(num_value = 2)]
    Ios,
    #[sea_orm(num_value = 3)]
    Harmonyos,
    #[sea_orm(num_value = 4)]
    Windows,
    #[sea_orm(num_value = 5)]
    Macos,
    #[sea_orm(num_value = 6)]
    Linux,
    #[sea_orm(num_value = 7)]
    Chrome,
    #[sea_orm(num_value = 8)]
    Wechat,
}

impl BuildPlatform {
    /// Platforms whose compilation is delegated to the remote CI system.
    pub fn is_remote_ci(&self) -> bool {
        matches!(self, BuildPlatform::AndroidApk)
    }

    /// Platforms that require a dotted-segment package/bundle identifier.
    pub fn requires_package_id(&self) -> bool {
        matches!(
            self,
            BuildPlatform::Android
                | BuildPlatform::AndroidApk
                | BuildPlatform::Ios
                | BuildPlatform::Harmonyos
        )
    }

    pub fn artifact_extension(&self) -> &'static str {
        match self {
            BuildPlatform::Android => "zip",
            BuildPlatform::AndroidApk => "apk",
            BuildPlatform::Ios => "ipa",
            BuildPlatform::Harmonyos => "hap",
            BuildPlatform::Windows => "zip",
            BuildPlatform::Macos => "zip",
            BuildPlatform::Linux => "zip",
            BuildPlatform::Chrome => "zip",
            BuildPlatform::Wechat => "zip",
        }
    }
}

impl std::fmt::Display for BuildPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildPlatform::Android => "android",
            BuildPlatform::AndroidApk => "android-apk",
            BuildPlatform::Ios => "ios",
            BuildPlatform::Harmonyos => "harmonyos",
            BuildPlatform::Windows => "windows",
            BuildPlatform::Macos => "macos",
            BuildPlatform::Linux => "linux",
            BuildPlatform::Chrome => "chrome",
            BuildPlatform::Wechat => "wechat",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for BuildPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "android" => Ok(BuildPlatform::Android),
            "android-apk" => Ok(BuildPlatform::AndroidApk),
            "ios" => Ok(BuildPlatform::Ios),
            "harmonyos" => Ok(BuildPlatform::Harmonyos),
            "windows" => Ok(BuildPlatform::Windows),
            "macos" => Ok(BuildPlatform::Macos),
            "linux" => Ok(BuildPlatform::Linux),
            "chrome" => Ok(BuildPlatform::Chrome),
            "wechat" => Ok(BuildPlatform::Wechat),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "build")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub owner: Uuid,
    pub platform: BuildPlatform,
    pub status: BuildStatus,
    pub progress: i32,
    pub app_name: String,
    pub package_id: String,
    pub version_name: String,
    pub version_code: i32,
    pub url: String,
    pub privacy_policy: Option<String>,
    pub icon_path: Option<String>,
    pub icon_url: Option<String>,
    pub error_message: Option<String>,
    pub output_file_path: Option<String>,
    pub source_file_path: Option<String>,
    pub ci_run_id: Option<i64>,
    pub ci_artifact_url: Option<String>,
    pub syncing_since: Option<NaiveDateTime>,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Owner",
        to = "super::user::Column::Id"
    )]
    Owner,
}

impl ActiveModelBehavior for ActiveModel {}
