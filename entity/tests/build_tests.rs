/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Tests for build entity

use chrono::NaiveDate;
use entity::*;
use sea_orm::{DatabaseBackend, MockDatabase, entity::prelude::*};
use uuid::Uuid;

fn naive(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn test_build_entity_completed() -> Result<(), DbErr> {
    let build_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let naive_date = naive(2026, 1, 1);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![build::Model {
            id: build_id,
            owner: owner_id,
            platform: build::BuildPlatform::AndroidApk,
            status: build::BuildStatus::Completed,
            progress: 100,
            app_name: "Example".to_owned(),
            package_id: "com.example.app".to_owned(),
            version_name: "1.0.0".to_owned(),
            version_code: 1,
            url: "https://example.com".to_owned(),
            privacy_policy: None,
            icon_path: None,
            icon_url: None,
            error_message: None,
            output_file_path: Some("builds/abc/Example.apk".to_owned()),
            source_file_path: None,
            ci_run_id: Some(12345),
            ci_artifact_url: None,
            syncing_since: None,
            expires_at: naive(2026, 1, 8),
            created_at: naive_date,
            updated_at: naive_date,
        }]])
        .into_connection();

    let result = build::Entity::find_by_id(build_id).one(&db).await?;

    assert!(result.is_some());
    let build = result.unwrap();
    assert_eq!(build.status, build::BuildStatus::Completed);
    assert_eq!(build.progress, 100);
    assert!(build.output_file_path.is_some());
    assert_eq!(build.owner, owner_id);

    Ok(())
}

#[tokio::test]
async fn test_build_entity_failed_carries_message() -> Result<(), DbErr> {
    let build_id = Uuid::new_v4();
    let naive_date = naive(2026, 1, 1);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![build::Model {
            id: build_id,
            owner: Uuid::new_v4(),
            platform: build::BuildPlatform::Windows,
            status: build::BuildStatus::Failed,
            progress: 40,
            app_name: "Example".to_owned(),
            package_id: String::new(),
            version_name: "1.0.0".to_owned(),
            version_code: 1,
            url: "https://example.com".to_owned(),
            privacy_policy: None,
            icon_path: None,
            icon_url: None,
            error_message: Some("Template missing".to_owned()),
            output_file_path: None,
            source_file_path: None,
            ci_run_id: None,
            ci_artifact_url: None,
            syncing_since: None,
            expires_at: naive(2026, 1, 8),
            created_at: naive_date,
            updated_at: naive_date,
        }]])
        .into_connection();

    let build = build::Entity::find_by_id(build_id).one(&db).await?.unwrap();

    assert_eq!(build.status, build::BuildStatus::Failed);
    assert!(build.error_message.is_some());
    assert!(build.output_file_path.is_none());

    Ok(())
}
