/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! GitHub Actions client for CI-dispatched builds: workflow dispatch,
//! run status, artifact download, and artifact unpacking.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

use super::consts::{APK_EXTENSION, APK_NESTED_DIR};
use super::types::Cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
}

impl RunStatus {
    fn parse(s: &str) -> Self {
        match s {
            "completed" => RunStatus::Completed,
            "in_progress" => RunStatus::InProgress,
            _ => RunStatus::Queued,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub id: i64,
    pub status: RunStatus,
    pub conclusion: Option<String>,
}

impl WorkflowRun {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Completed && self.conclusion.as_deref() == Some("success")
    }
}

#[derive(Deserialize)]
struct RawRun {
    id: i64,
    status: String,
    conclusion: Option<String>,
}

impl From<RawRun> for WorkflowRun {
    fn from(raw: RawRun) -> Self {
        WorkflowRun {
            id: raw.id,
            status: RunStatus::parse(&raw.status),
            conclusion: raw.conclusion,
        }
    }
}

#[derive(Deserialize)]
struct RawRunList {
    workflow_runs: Vec<RawRun>,
}

#[derive(Deserialize)]
struct RawArtifact {
    name: String,
    archive_download_url: String,
    expired: bool,
}

#[derive(Deserialize)]
struct RawArtifactList {
    artifacts: Vec<RawArtifact>,
}

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    owner: Option<String>,
    repo: Option<String>,
    workflow: String,
    branch: String,
    token: String,
}

impl GithubClient {
    pub fn from_cli(cli: &Cli) -> Self {
        GithubClient {
            http: reqwest::Client::new(),
            api_url: cli.github_api_url.trim_end_matches('/').to_string(),
            owner: cli.github_owner.clone(),
            repo: cli.github_repo.clone(),
            workflow: cli.github_workflow.clone(),
            branch: cli.github_branch.clone(),
            token: cli.github_token(),
        }
    }

    fn repo_url(&self) -> Result<String> {
        let owner = self
            .owner
            .as_deref()
            .context("GitHub CI is not configured (missing owner)")?;
        let repo = self
            .repo
            .as_deref()
            .context("GitHub CI is not configured (missing repo)")?;

        Ok(format!("{}/repos/{}/{}", self.api_url, owner, repo))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "appforge-server")
    }

    /// Kicks off the APK compile workflow. The build id travels in the
    /// workflow inputs so an orphaned record can be matched back to its
    /// run.
    pub async fn dispatch_workflow(&self, build_id: Uuid, source_url: &str) -> Result<()> {
        let url = format!(
            "{}/actions/workflows/{}/dispatches",
            self.repo_url()?,
            self.workflow
        );

        let body = serde_json::json!({
            "ref": self.branch,
            "inputs": {
                "build_id": build_id.to_string(),
                "source_url": source_url,
            },
        });

        let resp = self
            .request(reqwest::Method::POST, &url)
            .json(&body)
            .send()
            .await
            .context("Failed to dispatch workflow")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Workflow dispatch failed: {} {}", status, text);
        }

        Ok(())
    }

    pub async fn get_run(&self, run_id: i64) -> Result<WorkflowRun> {
        let url = format!("{}/actions/runs/{}", self.repo_url()?, run_id);

        let resp = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .context("Failed to query workflow run")?;

        if !resp.status().is_success() {
            anyhow::bail!("Workflow run query failed: {}", resp.status());
        }

        let raw: RawRun = resp
            .json()
            .await
            .context("Failed to parse workflow run response")?;

        Ok(raw.into())
    }

    /// Recent runs of the configured workflow, newest first. Used by the
    /// run-id recovery heuristic.
    pub async fn list_recent_runs(&self, limit: usize) -> Result<Vec<WorkflowRun>> {
        let url = format!(
            "{}/actions/workflows/{}/runs?per_page={}",
            self.repo_url()?,
            self.workflow,
            limit
        );

        let resp = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .context("Failed to list workflow runs")?;

        if !resp.status().is_success() {
            anyhow::bail!("Workflow run listing failed: {}", resp.status());
        }

        let raw: RawRunList = resp
            .json()
            .await
            .context("Failed to parse workflow run listing")?;

        Ok(raw.workflow_runs.into_iter().map(Into::into).collect())
    }

    /// Downloads the named artifact of a run as a zip. `None` when the
    /// run has no artifact by that name (or it already expired on the CI
    /// side).
    pub async fn download_artifact(&self, run_id: i64, name: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/actions/runs/{}/artifacts", self.repo_url()?, run_id);

        let resp = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .context("Failed to list run artifacts")?;

        if !resp.status().is_success() {
            anyhow::bail!("Artifact listing failed: {}", resp.status());
        }

        let raw: RawArtifactList = resp
            .json()
            .await
            .context("Failed to parse artifact listing")?;

        let artifact = match raw
            .artifacts
            .into_iter()
            .find(|a| a.name == name && !a.expired)
        {
            Some(a) => a,
            None => return Ok(None),
        };

        let resp = self
            .request(reqwest::Method::GET, &artifact.archive_download_url)
            .send()
            .await
            .context("Failed to download artifact")?;

        if !resp.status().is_success() {
            anyhow::bail!("Artifact download failed: {}", resp.status());
        }

        let bytes = resp
            .bytes()
            .await
            .context("Failed to read artifact body")?;

        Ok(Some(bytes.to_vec()))
    }
}

/// Searches a downloaded artifact zip for the compiled APK under the
/// Gradle output layout. A zip without a matching entry is a hard
/// failure for the build.
pub fn extract_nested_apk(zip_bytes: &[u8]) -> Result<Vec<u8>> {
    let cursor = std::io::Cursor::new(zip_bytes);
    let mut archive = zip::ZipArchive::new(cursor).context("CI artifact is not a valid zip")?;

    let mut candidates: Vec<String> = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).context("Failed to read zip entry")?;
        let name = entry.name().to_string();

        if !entry.is_dir() && name.ends_with(APK_EXTENSION) {
            candidates.push(name);
        }
    }

    // Prefer the release output when the artifact carries several APKs.
    let chosen = candidates
        .iter()
        .find(|name| name.contains(APK_NESTED_DIR) && name.contains("release"))
        .or_else(|| candidates.iter().find(|name| name.contains(APK_NESTED_DIR)))
        .or_else(|| candidates.first())
        .cloned();

    let chosen = match chosen {
        Some(name) => name,
        None => anyhow::bail!("APK file not found in CI artifact"),
    };

    let mut entry = archive
        .by_name(&chosen)
        .context("Failed to reopen zip entry")?;

    let mut data = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut data)
        .context("Failed to read APK from artifact")?;

    Ok(data)
}
