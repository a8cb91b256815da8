use std::collections::HashSet;
use std::path::{Component, Path};

use anyhow::{anyhow, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEntry {
    pub path: String,
    pub mode: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionUnit {
    pub name: String,
    pub source_dir: String,
    #[serde(default)]
    pub build_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutableSpec {
    pub name: String,
    pub entry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginSpec {
    pub name: String,
    pub entry: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArtifact {
    pub name: String,
    pub version: Version,
    pub entries: Vec<PayloadEntry>,
    pub extensions: Vec<ExtensionUnit>,
    pub executables: Vec<ExecutableSpec>,
    pub plugins: Vec<PluginSpec>,
    pub post_install_message: Option<String>,
    pub expected_sha256: String,
}

impl PackageArtifact {
    pub fn full_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// The exact byte sequence the artifact checksum is computed over:
    /// entries in declared order, each prefixed with a `path \n mode \n len \n`
    /// header. The digest therefore matches one computed from the original
    /// distributable rather than from the extracted tree.
    pub fn payload_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        for entry in &self.entries {
            buffer.extend_from_slice(entry.path.as_bytes());
            buffer.push(b'\n');
            buffer.extend_from_slice(format!("{:o}\n{}\n", entry.mode, entry.data.len()).as_bytes());
            buffer.extend_from_slice(&entry.data);
        }
        buffer
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("artifact name must not be empty"));
        }
        if self.name.contains('/') || self.name.contains('\\') {
            return Err(anyhow!("artifact name must not contain path separators: {}", self.name));
        }
        if self.expected_sha256.trim().is_empty() {
            return Err(anyhow!("artifact '{}' declares no expected checksum", self.name));
        }

        let mut seen_paths = HashSet::new();
        for entry in &self.entries {
            validated_relative_path(&entry.path)?;
            if !seen_paths.insert(entry.path.as_str()) {
                return Err(anyhow!("duplicate payload entry: {}", entry.path));
            }
        }

        let mut seen_executables = HashSet::new();
        for executable in &self.executables {
            if executable.name.trim().is_empty() {
                return Err(anyhow!("executable name must not be empty"));
            }
            validated_relative_path(&executable.entry)?;
            if !seen_paths.contains(executable.entry.as_str()) {
                return Err(anyhow!(
                    "executable '{}' points at '{}', which is not a payload entry",
                    executable.name,
                    executable.entry
                ));
            }
            if !seen_executables.insert(executable.name.as_str()) {
                return Err(anyhow!("duplicate executable declaration: {}", executable.name));
            }
        }

        let mut seen_plugins = HashSet::new();
        for plugin in &self.plugins {
            if plugin.name.trim().is_empty() {
                return Err(anyhow!("plugin name must not be empty"));
            }
            validated_relative_path(&plugin.entry)?;
            if !seen_plugins.insert(plugin.name.as_str()) {
                return Err(anyhow!("duplicate plugin declaration: {}", plugin.name));
            }
        }

        let mut seen_extensions = HashSet::new();
        for extension in &self.extensions {
            if extension.name.trim().is_empty() {
                return Err(anyhow!("extension name must not be empty"));
            }
            validated_relative_path(&extension.source_dir)?;
            if !seen_extensions.insert(extension.name.as_str()) {
                return Err(anyhow!("duplicate extension declaration: {}", extension.name));
            }
        }

        Ok(())
    }
}

pub fn validated_relative_path(path: &str) -> Result<&Path> {
    let relative = Path::new(path);
    if relative.as_os_str().is_empty() {
        return Err(anyhow!("payload path must not be empty"));
    }
    if relative.is_absolute() {
        return Err(anyhow!("payload path must be relative: {path}"));
    }
    if relative
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(anyhow!("payload path must not include '..': {path}"));
    }
    Ok(relative)
}
