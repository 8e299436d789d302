/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#[cfg(test)]
mod tests {
    use crate::github::extract_nested_apk;
    use crate::input::*;
    use crate::quota::{check_daily_quota, consume_daily_quota};
    use crate::storage::*;
    use chrono::Utc;
    use entity::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::io::Write;
    use uuid::Uuid;

    fn mock_wallet(user: Uuid, used: i32, limit: i32, reset_at: &str) -> wallet::Model {
        let now = Utc::now().naive_utc();
        wallet::Model {
            id: Uuid::new_v4(),
            user,
            daily_builds_limit: limit,
            daily_builds_used: used,
            daily_builds_reset_at: reset_at.to_string(),
            file_retention_days: 7,
            created_at: now,
            updated_at: now,
        }
    }

    fn today() -> String {
        crate::quota::today_string()
    }

    #[tokio::test]
    async fn test_check_daily_quota_within_limit() {
        let user = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_wallet(user, 2, 5, &today())]])
            .into_connection();

        let check = check_daily_quota(&db, user, 3).await.unwrap();

        assert!(check.allowed);
        assert_eq!(check.remaining, 3);
        assert_eq!(check.limit, 5);
    }

    #[tokio::test]
    async fn test_check_daily_quota_exceeded() {
        let user = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_wallet(user, 5, 5, &today())]])
            .into_connection();

        let check = check_daily_quota(&db, user, 1).await.unwrap();

        assert!(!check.allowed);
        assert_eq!(check.remaining, 0);
    }

    #[tokio::test]
    async fn test_check_daily_quota_lazy_reset() {
        let user = Uuid::new_v4();
        // Exhausted yesterday; the stale marker means the counter reads
        // as zero today.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_wallet(user, 5, 5, "2020-01-01")]])
            .into_connection();

        let check = check_daily_quota(&db, user, 5).await.unwrap();

        assert!(check.allowed);
        assert_eq!(check.remaining, 5);
    }

    #[tokio::test]
    async fn test_consume_daily_quota_rejects_over_limit() {
        let user = Uuid::new_v4();
        // No exec results appended: a rejected consume must not touch
        // the ledger, so the query for the wallet is the only call.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_wallet(user, 4, 5, &today())]])
            .into_connection();

        let consumed = consume_daily_quota(&db, user, 2).await.unwrap();

        assert!(!consumed);
    }

    #[tokio::test]
    async fn test_consume_daily_quota_deducts() {
        let user = Uuid::new_v4();
        let wallet = mock_wallet(user, 1, 5, &today());
        let mut updated = wallet.clone();
        updated.daily_builds_used = 3;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![wallet], vec![updated]])
            .into_connection();

        let consumed = consume_daily_quota(&db, user, 2).await.unwrap();

        assert!(consumed);
    }

    #[test]
    fn test_valid_target_url() {
        assert!(valid_target_url("https://example.com"));
        assert!(valid_target_url("http://example.com/path?q=1"));
        assert!(!valid_target_url("example.com"));
        assert!(!valid_target_url("ftp://example.com"));
        assert!(!valid_target_url("https://"));
        assert!(!valid_target_url(""));
    }

    #[test]
    fn test_valid_package_identifier() {
        assert!(valid_package_identifier("com.example.app"));
        assert!(valid_package_identifier("io.wavelens.app_forge"));
        assert!(valid_package_identifier("a.b"));
        assert!(!valid_package_identifier("com"));
        assert!(!valid_package_identifier("com..app"));
        assert!(!valid_package_identifier(".com.app"));
        assert!(!valid_package_identifier("com.1app"));
        assert!(!valid_package_identifier("com.app-name"));
        assert!(!valid_package_identifier(""));
    }

    #[test]
    fn test_valid_version_name() {
        assert!(valid_version_name("1"));
        assert!(valid_version_name("1.0"));
        assert!(valid_version_name("1.0.3"));
        assert!(!valid_version_name(""));
        assert!(!valid_version_name("1."));
        assert!(!valid_version_name("v1.0"));
    }

    #[test]
    fn test_safe_object_path() {
        assert!(safe_object_path("builds/abc/app.apk"));
        assert!(!safe_object_path("../etc/passwd"));
        assert!(!safe_object_path("builds/../../etc"));
        assert!(!safe_object_path("/absolute"));
        assert!(!safe_object_path("builds//double"));
        assert!(!safe_object_path(""));
    }

    #[test]
    fn test_sign_and_verify_download() {
        let build_id = Uuid::new_v4();
        let expires = Utc::now().timestamp() + 600;
        let signature = sign_download("secret", build_id, DOWNLOAD_KIND_ARTIFACT, expires);

        assert!(verify_download(
            "secret",
            build_id,
            DOWNLOAD_KIND_ARTIFACT,
            expires,
            &signature
        ));

        // Tampered signature
        assert!(!verify_download(
            "secret",
            build_id,
            DOWNLOAD_KIND_ARTIFACT,
            expires,
            "deadbeef"
        ));

        // Wrong kind must not be interchangeable
        assert!(!verify_download(
            "secret",
            build_id,
            DOWNLOAD_KIND_SOURCE,
            expires,
            &signature
        ));

        // Wrong build id
        assert!(!verify_download(
            "secret",
            Uuid::new_v4(),
            DOWNLOAD_KIND_ARTIFACT,
            expires,
            &signature
        ));
    }

    #[test]
    fn test_verify_download_expired() {
        let build_id = Uuid::new_v4();
        let expires = Utc::now().timestamp() - 10;
        let signature = sign_download("secret", build_id, DOWNLOAD_KIND_ARTIFACT, expires);

        assert!(!verify_download(
            "secret",
            build_id,
            DOWNLOAD_KIND_ARTIFACT,
            expires,
            &signature
        ));
    }

    fn zip_with_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (name, data) in entries {
            writer.start_file(name.to_string(), options).unwrap();
            writer.write_all(data).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_nested_apk() {
        let zip_bytes = zip_with_entries(&[
            ("output-metadata.json", b"{}"),
            (
                "app/build/outputs/apk/release/app-release.apk",
                b"APK-BYTES",
            ),
        ]);

        let apk = extract_nested_apk(&zip_bytes).unwrap();
        assert_eq!(apk, b"APK-BYTES");
    }

    #[test]
    fn test_extract_nested_apk_prefers_release() {
        let zip_bytes = zip_with_entries(&[
            ("app/build/outputs/apk/debug/app-debug.apk", b"DEBUG"),
            ("app/build/outputs/apk/release/app-release.apk", b"RELEASE"),
        ]);

        let apk = extract_nested_apk(&zip_bytes).unwrap();
        assert_eq!(apk, b"RELEASE");
    }

    #[test]
    fn test_extract_nested_apk_not_found() {
        let zip_bytes = zip_with_entries(&[("readme.txt", b"no apk here")]);

        let err = extract_nested_apk(&zip_bytes).unwrap_err();
        assert!(err.to_string().contains("APK file not found"));
    }

    #[test]
    fn test_extract_nested_apk_invalid_zip() {
        assert!(extract_nested_apk(b"not a zip").is_err());
    }

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_str().unwrap());

        let path = build_object_path(Uuid::new_v4(), "app.apk");
        store.upload(&path, b"artifact").await.unwrap();

        assert!(store.exists(&path).await.unwrap());
        assert_eq!(store.download(&path).await.unwrap(), b"artifact");

        store.delete(&path).await.unwrap();
        assert!(!store.exists(&path).await.unwrap());

        // Deleting an absent object is not an error
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_str().unwrap());

        assert!(store.upload("../escape.bin", b"x").await.is_err());
        assert!(store.download("builds/../../etc/passwd").await.is_err());
    }
}
