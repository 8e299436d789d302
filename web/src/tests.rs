/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#[cfg(test)]
mod tests {
    use crate::app_router;
    use crate::auth::{decode_jwt, encode_jwt};
    use axum_test::TestServer;
    use chrono::Utc;
    use appcore::github::GithubClient;
    use appcore::storage::LocalStore;
    use appcore::types::*;
    use entity::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use uuid::Uuid;

    fn create_mock_cli() -> Cli {
        Cli {
            log_level: "info".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 3000,
            serve_url: "http://127.0.0.1:3000".to_string(),
            database_url: Some("mock://test".to_string()),
            database_url_file: None,
            max_concurrent_builds: 32,
            base_path: ".".to_string(),
            storage_backend: "local".to_string(),
            template_path: "templates".to_string(),
            icon_max_bytes: 2097152,
            download_url_ttl: 3600,
            stuck_after_secs: 120,
            sync_claim_stale_secs: 300,
            jwt_secret_file: "test_jwt".to_string(),
            sign_secret_file: "test_sign".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            github_owner: None,
            github_repo: None,
            github_workflow: "build-apk.yml".to_string(),
            github_branch: "main".to_string(),
            github_token_file: None,
            github_webhook_secret_file: None,
            report_errors: false,
        }
    }

    fn create_state(db: DatabaseConnection) -> Arc<ServerState> {
        let cli = create_mock_cli();
        let github = GithubClient::from_cli(&cli);

        Arc::new(ServerState {
            db,
            cli,
            store: Arc::new(LocalStore::new(".")),
            github,
            http: reqwest::Client::new(),
        })
    }

    fn mock_user(id: Uuid) -> user::Model {
        let now = Utc::now().naive_utc();
        user::Model {
            id,
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            created_at: now,
            last_login_at: now,
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let server = TestServer::new(app_router(create_state(db))).unwrap();

        let response = server.get("/api/health").await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let server = TestServer::new(app_router(create_state(db))).unwrap();

        let response = server.get("/api/nonsense").await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_build_list_requires_auth() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let server = TestServer::new(app_router(create_state(db))).unwrap();

        let response = server.get("/api/build").await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_build_list_with_token() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // auth middleware resolves the user, then the empty list
            .append_query_results([vec![mock_user(user_id)]])
            .append_query_results([Vec::<build::Model>::new()])
            .into_connection();
        let state = create_state(db);

        let token = encode_jwt(&state.cli.jwt_secret(), user_id).unwrap();
        let server = TestServer::new(app_router(state)).unwrap();

        let response = server
            .get("/api/build")
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let body: BaseResponse<Vec<serde_json::Value>> = response.json();
        assert!(!body.error);
        assert!(body.message.is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_platform() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_user(user_id)]])
            .into_connection();
        let state = create_state(db);

        let token = encode_jwt(&state.cli.jwt_secret(), user_id).unwrap();
        let server = TestServer::new(app_router(state)).unwrap();

        let response = server
            .post("/api/build/symbian")
            .authorization_bearer(&token)
            .json(&serde_json::json!({
                "app_name": "Example",
                "url": "https://example.com",
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_download_rejects_bad_signature() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let server = TestServer::new(app_router(create_state(db))).unwrap();

        let build_id = Uuid::new_v4();
        let response = server
            .get(&format!(
                "/api/download/{}?expires=9999999999&signature=deadbeef",
                build_id
            ))
            .await;

        response.assert_status_forbidden();
    }

    #[test]
    fn test_jwt_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = encode_jwt("secret", user_id).unwrap();
        let data = decode_jwt("secret", &token).unwrap();

        assert_eq!(data.claims.id, user_id);
        assert!(decode_jwt("other-secret", &token).is_err());
    }

    mod request_tests {
        use crate::requests::*;

        #[test]
        fn test_make_build_request_defaults() {
            let request: MakeBuildRequest = serde_json::from_str(
                r#"{"app_name": "Example", "url": "https://example.com"}"#,
            )
            .unwrap();

            assert_eq!(request.version_name, "1.0.0");
            assert_eq!(request.version_code, 1);
            assert!(request.package_id.is_none());
        }

        #[test]
        fn test_batch_request_deserialization() {
            let request: MakeBatchRequest = serde_json::from_str(
                r#"{
                    "url": "https://example.com",
                    "platforms": [
                        {"platform": "android-apk", "app_name": "Example", "package_id": "com.example.app"},
                        {"platform": "windows", "app_name": "Example"}
                    ]
                }"#,
            )
            .unwrap();

            assert_eq!(request.platforms.len(), 2);
            assert_eq!(request.platforms[0].platform, "android-apk");
        }

        #[test]
        fn test_callback_request_deserialization() {
            let request: CallbackRequest = serde_json::from_str(
                r#"{"status": "success", "run_id": 12345, "artifact_url": "https://ci.example.com/a/1"}"#,
            )
            .unwrap();

            assert_eq!(request.status, "success");
            assert_eq!(request.run_id, 12345);
        }
    }
}
