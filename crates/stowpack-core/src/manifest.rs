use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::artifact::{
    validated_relative_path, ExecutableSpec, ExtensionUnit, PackageArtifact, PayloadEntry,
    PluginSpec,
};

pub const MANIFEST_FILE_NAME: &str = "stowpack.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFile {
    pub path: String,
    pub mode: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    pub version: Version,
    pub license: Option<String>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    #[serde(default)]
    pub executables: Vec<ExecutableSpec>,
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
    #[serde(default)]
    pub extensions: Vec<ExtensionUnit>,
    pub post_install_message: Option<String>,
    pub sha256: Option<String>,
}

impl PackageManifest {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(input).context("failed to parse stowpack manifest")?;
        if manifest.name.trim().is_empty() {
            return Err(anyhow!("manifest name must not be empty"));
        }

        let mut seen_files = HashSet::new();
        for file in &manifest.files {
            validated_relative_path(&file.path)
                .with_context(|| format!("invalid file declaration in manifest '{}'", manifest.name))?;
            if !seen_files.insert(file.path.as_str()) {
                return Err(anyhow!(
                    "duplicate file declaration '{}' in manifest '{}'",
                    file.path,
                    manifest.name
                ));
            }
        }

        for executable in &manifest.executables {
            if !seen_files.contains(executable.entry.as_str()) {
                return Err(anyhow!(
                    "executable '{}' points at '{}', which is not a declared file",
                    executable.name,
                    executable.entry
                ));
            }
        }
        for plugin in &manifest.plugins {
            if !seen_files.contains(plugin.entry.as_str()) {
                return Err(anyhow!(
                    "plugin '{}' points at '{}', which is not a declared file",
                    plugin.name,
                    plugin.entry
                ));
            }
        }
        for extension in &manifest.extensions {
            validated_relative_path(&extension.source_dir).with_context(|| {
                format!(
                    "invalid extension source dir for '{}' in manifest '{}'",
                    extension.name, manifest.name
                )
            })?;
        }

        Ok(manifest)
    }
}

pub fn load_artifact(source_dir: &Path) -> Result<PackageArtifact> {
    let manifest_path = source_dir.join(MANIFEST_FILE_NAME);
    let raw = fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read package manifest: {}", manifest_path.display()))?;
    let manifest = PackageManifest::from_toml_str(&raw)
        .with_context(|| format!("invalid package manifest: {}", manifest_path.display()))?;
    build_artifact(&manifest, source_dir)
}

pub fn build_artifact(manifest: &PackageManifest, source_dir: &Path) -> Result<PackageArtifact> {
    let executable_entries: HashSet<&str> = manifest
        .executables
        .iter()
        .map(|executable| executable.entry.as_str())
        .collect();

    let mut entries = Vec::with_capacity(manifest.files.len());
    for file in &manifest.files {
        let full = source_dir.join(&file.path);
        let data = fs::read(&full)
            .with_context(|| format!("failed to read payload file: {}", full.display()))?;
        let default_mode = if executable_entries.contains(file.path.as_str()) {
            0o755
        } else {
            0o644
        };
        entries.push(PayloadEntry {
            path: file.path.clone(),
            mode: file.mode.unwrap_or(default_mode),
            data,
        });
    }

    let mut artifact = PackageArtifact {
        name: manifest.name.clone(),
        version: manifest.version.clone(),
        entries,
        extensions: manifest.extensions.clone(),
        executables: manifest.executables.clone(),
        plugins: manifest.plugins.clone(),
        post_install_message: manifest.post_install_message.clone(),
        expected_sha256: manifest.sha256.clone().unwrap_or_default(),
    };
    if artifact.expected_sha256.is_empty() {
        artifact.expected_sha256 = stowpack_security::sha256_hex(&artifact.payload_bytes());
    }
    artifact.validate()?;
    Ok(artifact)
}
