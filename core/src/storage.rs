/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use super::input::safe_object_path;
use super::types::Cli;

type HmacSha256 = Hmac<Sha256>;

/// Storage capability the orchestrator is parameterized over. Backends
/// are selected once at startup; everything above this trait is
/// backend-agnostic.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores an object and returns its reference (the path it is
    /// addressable under).
    async fn upload(&self, path: &str, data: &[u8]) -> Result<String>;
    async fn download(&self, path: &str) -> Result<Vec<u8>>;
    async fn delete(&self, path: &str) -> Result<()>;
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem-backed store rooted at `--base-path`. Objects live under
/// `{base_path}/{path}` with the `builds/{build_id}/...` key convention.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: &str) -> Self {
        LocalStore {
            root: PathBuf::from(base_path),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if !safe_object_path(path) {
            anyhow::bail!("Invalid object path: {}", path);
        }

        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn upload(&self, path: &str, data: &[u8]) -> Result<String> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory for {}", path))?;
        }

        tokio::fs::write(&target, data)
            .await
            .with_context(|| format!("Failed to write object {}", path))?;

        Ok(path.to_string())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;

        tokio::fs::read(&target)
            .await
            .with_context(|| format!("Failed to read object {}", path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete object {}", path)),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await.unwrap_or(false))
    }
}

pub fn select_store(cli: &Cli) -> Result<Arc<dyn ArtifactStore>> {
    match cli.storage_backend.as_str() {
        "local" => Ok(Arc::new(LocalStore::new(&cli.base_path))),
        other => anyhow::bail!("Unknown storage backend: {}", other),
    }
}

pub fn build_object_path(build_id: Uuid, file_name: &str) -> String {
    format!("builds/{}/{}", build_id, file_name)
}

/// What a signed link grants access to: the finished artifact, or the
/// stage-1 source bundle handed to the CI system.
pub const DOWNLOAD_KIND_ARTIFACT: &str = "artifact";
pub const DOWNLOAD_KIND_SOURCE: &str = "source";

/// Signs `{build_id}:{kind}:{expires}` so download links cannot be
/// forged, repurposed, or replayed past their expiry.
pub fn sign_download(secret: &str, build_id: Uuid, kind: &str, expires: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}:{}:{}", build_id, kind, expires).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn verify_download(
    secret: &str,
    build_id: Uuid,
    kind: &str,
    expires: i64,
    signature: &str,
) -> bool {
    if expires < Utc::now().timestamp() {
        return false;
    }

    let sig_bytes = match hex::decode(signature) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(format!("{}:{}:{}", build_id, kind, expires).as_bytes());

    mac.verify_slice(&sig_bytes).is_ok()
}

/// Short-lived download URL, re-signed on every read instead of being
/// persisted.
pub fn temp_download_url(
    serve_url: &str,
    secret: &str,
    build_id: Uuid,
    kind: &str,
    ttl_secs: i64,
) -> String {
    let expires = Utc::now().timestamp() + ttl_secs;
    let signature = sign_download(secret, build_id, kind, expires);

    format!(
        "{}/api/download/{}?kind={}&expires={}&signature={}",
        serve_url.trim_end_matches('/'),
        build_id,
        kind,
        expires,
        signature
    )
}
