/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use std::ops::RangeInclusive;

pub const PORT_RANGE: RangeInclusive<usize> = 1..=65535;

/// Date string format used by the wallet's lazy daily reset marker.
pub const QUOTA_DATE_FORMAT: &str = "%Y-%m-%d";

/// Plan defaults applied when a wallet is created on first use.
pub const DEFAULT_DAILY_BUILDS: i32 = 5;
pub const DEFAULT_RETENTION_DAYS: i32 = 7;

/// Remote icon fetch: one attempt per entry, timeouts escalate to
/// tolerate slow origins.
pub const ICON_FETCH_TIMEOUTS: [u64; 3] = [30, 45, 60];

/// Name of the workflow artifact the CI system uploads for APK builds.
pub const APK_ARTIFACT_NAME: &str = "app-release";

/// The compiled APK sits nested inside the artifact zip under the Gradle
/// output layout.
pub const APK_NESTED_DIR: &str = "outputs/apk/";

pub const APK_EXTENSION: &str = ".apk";

/// Object name of the stage-1 source bundle for CI-dispatched builds.
pub const SOURCE_BUNDLE_NAME: &str = "source.zip";

/// Progress value a CI-dispatched build parks at while the remote run
/// is in flight; the watchdog keys off this.
pub const CI_DISPATCHED_PROGRESS: i32 = 50;

pub const SHARE_CODE_LENGTH: usize = 8;
