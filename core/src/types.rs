/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::github::GithubClient;
use super::input::{greater_than_zero, load_secret, port_in_range};
use super::storage::ArtifactStore;
use clap::Parser;
use entity::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser, Debug, Clone)]
#[command(name = "Appforge", display_name = "Appforge", bin_name = "appforge-server", author = "Wavelens", version, about, long_about = None)]
pub struct Cli {
    #[arg(long, env = "APPFORGE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    #[arg(long, env = "APPFORGE_IP", default_value = "127.0.0.1")]
    pub ip: String,
    #[arg(long, env = "APPFORGE_PORT", value_parser = port_in_range, default_value_t = 3000)]
    pub port: u16,
    #[arg(
        long,
        env = "APPFORGE_SERVE_URL",
        default_value = "http://127.0.0.1:3000"
    )]
    pub serve_url: String,
    #[arg(long, env = "APPFORGE_DATABASE_URL")]
    pub database_url: Option<String>,
    #[arg(long, env = "APPFORGE_DATABASE_URL_FILE")]
    pub database_url_file: Option<String>,
    #[arg(long, env = "APPFORGE_MAX_CONCURRENT_BUILDS", value_parser = greater_than_zero::<usize>, default_value = "32")]
    pub max_concurrent_builds: usize,
    #[arg(long, env = "APPFORGE_BASE_PATH", default_value = ".")]
    pub base_path: String,
    #[arg(long, env = "APPFORGE_STORAGE_BACKEND", default_value = "local")]
    pub storage_backend: String,
    #[arg(long, env = "APPFORGE_TEMPLATE_PATH", default_value = "templates")]
    pub template_path: String,
    #[arg(long, env = "APPFORGE_ICON_MAX_BYTES", value_parser = greater_than_zero::<usize>, default_value = "2097152")]
    pub icon_max_bytes: usize,
    #[arg(long, env = "APPFORGE_DOWNLOAD_URL_TTL", value_parser = greater_than_zero::<i64>, default_value = "3600")]
    pub download_url_ttl: i64,
    #[arg(long, env = "APPFORGE_STUCK_AFTER_SECS", value_parser = greater_than_zero::<i64>, default_value = "120")]
    pub stuck_after_secs: i64,
    #[arg(long, env = "APPFORGE_SYNC_CLAIM_STALE_SECS", value_parser = greater_than_zero::<i64>, default_value = "300")]
    pub sync_claim_stale_secs: i64,
    #[arg(long, env = "APPFORGE_JWT_SECRET_FILE")]
    pub jwt_secret_file: String,
    #[arg(long, env = "APPFORGE_SIGN_SECRET_FILE")]
    pub sign_secret_file: String,
    #[arg(long, env = "APPFORGE_GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api_url: String,
    #[arg(long, env = "APPFORGE_GITHUB_OWNER")]
    pub github_owner: Option<String>,
    #[arg(long, env = "APPFORGE_GITHUB_REPO")]
    pub github_repo: Option<String>,
    #[arg(long, env = "APPFORGE_GITHUB_WORKFLOW", default_value = "build-apk.yml")]
    pub github_workflow: String,
    #[arg(long, env = "APPFORGE_GITHUB_BRANCH", default_value = "main")]
    pub github_branch: String,
    #[arg(long, env = "APPFORGE_GITHUB_TOKEN_FILE")]
    pub github_token_file: Option<String>,
    #[arg(long, env = "APPFORGE_GITHUB_WEBHOOK_SECRET_FILE")]
    pub github_webhook_secret_file: Option<String>,
    #[arg(long, env = "APPFORGE_REPORT_ERRORS", default_value = "false")]
    pub report_errors: bool,
}

impl Cli {
    pub fn jwt_secret(&self) -> String {
        load_secret(&self.jwt_secret_file)
    }

    pub fn sign_secret(&self) -> String {
        load_secret(&self.sign_secret_file)
    }

    pub fn github_token(&self) -> String {
        self.github_token_file
            .as_deref()
            .map(load_secret)
            .unwrap_or_default()
    }

    pub fn github_webhook_secret(&self) -> String {
        self.github_webhook_secret_file
            .as_deref()
            .map(load_secret)
            .unwrap_or_default()
    }
}

pub struct ServerState {
    pub db: DatabaseConnection,
    pub cli: Cli,
    pub store: Arc<dyn ArtifactStore>,
    pub github: GithubClient,
    pub http: reqwest::Client,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BaseResponse<T> {
    pub error: bool,
    pub message: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    pub id: Uuid,
    pub name: String,
}

pub type ListResponse = Vec<ListItem>;

pub type EBuild = build::Entity;
pub type EShare = share::Entity;
pub type EUser = user::Entity;
pub type EWallet = wallet::Entity;

pub type MBuild = build::Model;
pub type MShare = share::Model;
pub type MUser = user::Model;
pub type MWallet = wallet::Model;

pub type ABuild = build::ActiveModel;
pub type AShare = share::ActiveModel;
pub type AUser = user::ActiveModel;
pub type AWallet = wallet::ActiveModel;

pub type CBuild = build::Column;
pub type CShare = share::Column;
pub type CUser = user::Column;
pub type CWallet = wallet::Column;

pub type RBuild = build::Relation;
pub type RShare = share::Relation;
pub type RWallet = wallet::Relation;
