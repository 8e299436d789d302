/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

mod tests;

pub mod consts;
pub mod database;
pub mod github;
pub mod input;
pub mod quota;
pub mod storage;
pub mod types;

use anyhow::{Context, Result};
use clap::Parser;
use database::connect_db;
use github::GithubClient;
use std::sync::Arc;
use storage::select_store;
use types::*;

pub async fn init_state() -> Result<Arc<ServerState>> {
    let cli = Cli::parse();

    println!("Starting Appforge Server on {}:{}", cli.ip, cli.port);

    let db = connect_db(&cli).await?;
    let store = select_store(&cli).context("Failed to initialize artifact store")?;
    let github = GithubClient::from_cli(&cli);
    let http = reqwest::Client::new();

    Ok(Arc::new(ServerState {
        db,
        cli,
        store,
        github,
        http,
    }))
}
