/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Tests for entity enums

use entity::*;
use std::str::FromStr;

#[test]
fn test_platform_from_str() {
    assert_eq!(
        build::BuildPlatform::from_str("android").unwrap(),
        build::BuildPlatform::Android
    );
    assert_eq!(
        build::BuildPlatform::from_str("android-apk").unwrap(),
        build::BuildPlatform::AndroidApk
    );
    assert_eq!(
        build::BuildPlatform::from_str("harmonyos").unwrap(),
        build::BuildPlatform::Harmonyos
    );
    assert_eq!(
        build::BuildPlatform::from_str("wechat").unwrap(),
        build::BuildPlatform::Wechat
    );

    assert!(build::BuildPlatform::from_str("symbian").is_err());
}

#[test]
fn test_platform_display_matches_wire_names() {
    assert_eq!(build::BuildPlatform::AndroidApk.to_string(), "android-apk");
    assert_eq!(build::BuildPlatform::Ios.to_string(), "ios");
    assert_eq!(build::BuildPlatform::Chrome.to_string(), "chrome");
}

#[test]
fn test_remote_ci_platforms() {
    assert!(build::BuildPlatform::AndroidApk.is_remote_ci());
    assert!(!build::BuildPlatform::Android.is_remote_ci());
    assert!(!build::BuildPlatform::Windows.is_remote_ci());
}

#[test]
fn test_package_id_requirement() {
    assert!(build::BuildPlatform::Android.requires_package_id());
    assert!(build::BuildPlatform::AndroidApk.requires_package_id());
    assert!(build::BuildPlatform::Ios.requires_package_id());
    assert!(build::BuildPlatform::Harmonyos.requires_package_id());
    assert!(!build::BuildPlatform::Linux.requires_package_id());
    assert!(!build::BuildPlatform::Chrome.requires_package_id());
}

#[test]
fn test_terminal_statuses() {
    assert!(!build::BuildStatus::Pending.is_terminal());
    assert!(!build::BuildStatus::Processing.is_terminal());
    assert!(build::BuildStatus::Completed.is_terminal());
    assert!(build::BuildStatus::Failed.is_terminal());
}

#[test]
fn test_artifact_extensions() {
    assert_eq!(build::BuildPlatform::AndroidApk.artifact_extension(), "apk");
    assert_eq!(build::BuildPlatform::Ios.artifact_extension(), "ipa");
    assert_eq!(build::BuildPlatform::Harmonyos.artifact_extension(), "hap");
    assert_eq!(build::BuildPlatform::Windows.artifact_extension(), "zip");
}
