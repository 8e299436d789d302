/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Artifact assembly seam. The packager takes a build configuration and
//! produces an installable bundle; the orchestration around it never
//! cares how. `TemplateAssembler` is the template-based implementation:
//! unzip the platform template, patch the embedded app manifest, inject
//! the icon, rezip.

use anyhow::{Context, Result};
use async_trait::async_trait;
use appcore::types::MBuild;
use std::io::{Read, Write};
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

/// Name of the config manifest every platform template carries.
const MANIFEST_NAME: &str = "app.json";

/// Entry the injected icon replaces inside the template.
const ICON_NAME: &str = "icon.png";

#[derive(Debug, Clone)]
pub struct AssembledArtifact {
    pub file_name: String,
    pub data: Vec<u8>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AssemblyService: Send + Sync {
    async fn assemble<'a>(&self, build: &MBuild, icon: Option<&'a [u8]>) -> Result<AssembledArtifact>;
}

pub struct TemplateAssembler {
    template_path: PathBuf,
}

impl TemplateAssembler {
    pub fn new(template_path: &str) -> Self {
        TemplateAssembler {
            template_path: PathBuf::from(template_path),
        }
    }

    fn patch_manifest(&self, raw: &[u8], build: &MBuild) -> Result<Vec<u8>> {
        let mut manifest: serde_json::Value =
            serde_json::from_slice(raw).context("Template manifest is not valid JSON")?;

        let obj = manifest
            .as_object_mut()
            .context("Template manifest is not a JSON object")?;

        obj.insert("name".to_string(), build.app_name.clone().into());
        obj.insert("package".to_string(), build.package_id.clone().into());
        obj.insert("version".to_string(), build.version_name.clone().into());
        obj.insert("versionCode".to_string(), build.version_code.into());
        obj.insert("url".to_string(), build.url.clone().into());

        if let Some(policy) = &build.privacy_policy {
            obj.insert("privacyPolicy".to_string(), policy.clone().into());
        }

        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")
    }
}

#[async_trait]
impl AssemblyService for TemplateAssembler {
    async fn assemble<'a>(&self, build: &MBuild, icon: Option<&'a [u8]>) -> Result<AssembledArtifact> {
        let template_file = self
            .template_path
            .join(format!("{}.zip", build.platform));

        let template = tokio::fs::read(&template_file)
            .await
            .with_context(|| format!("No template for platform {}", build.platform))?;

        let cursor = std::io::Cursor::new(template.as_slice());
        let mut archive =
            zip::ZipArchive::new(cursor).context("Platform template is not a valid zip")?;

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).context("Failed to read template entry")?;
            let name = entry.name().to_string();

            if entry.is_dir() {
                writer
                    .add_directory(name, options)
                    .context("Failed to copy template directory")?;
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .context("Failed to read template entry")?;

            let data = if name == MANIFEST_NAME {
                self.patch_manifest(&data, build)?
            } else if name == ICON_NAME && icon.is_some() {
                icon.unwrap().to_vec()
            } else {
                data
            };

            writer
                .start_file(name, options)
                .context("Failed to write template entry")?;
            writer
                .write_all(&data)
                .context("Failed to write template entry")?;
        }

        let data = writer
            .finish()
            .context("Failed to finish assembled bundle")?
            .into_inner();

        Ok(AssembledArtifact {
            file_name: format!(
                "{}.{}",
                sanitize_file_name(&build.app_name),
                build.platform.artifact_extension()
            ),
            data,
        })
    }
}

/// App names end up as object keys and download file names; keep them to
/// a conservative character set.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "app".to_string()
    } else {
        cleaned
    }
}
