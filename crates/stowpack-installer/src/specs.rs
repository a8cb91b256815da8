use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use semver::Version;

use crate::layout::InstallLayout;

/// The durable record of a completed install. Deliberately carries no
/// wall-clock field so that re-installing the same artifact leaves a
/// byte-identical tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledSpec {
    pub name: String,
    pub version: Version,
    pub platform: String,
    pub executables: Vec<String>,
    pub plugins: Vec<String>,
    pub extensions: Vec<String>,
    pub sha256: String,
}

impl InstalledSpec {
    pub fn full_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

pub fn serialize_spec_record(spec: &InstalledSpec) -> String {
    let mut payload = String::new();
    payload.push_str(&format!("name={}\n", spec.name));
    payload.push_str(&format!("version={}\n", spec.version));
    payload.push_str(&format!("platform={}\n", spec.platform));
    for executable in &spec.executables {
        payload.push_str(&format!("executable={}\n", executable));
    }
    for plugin in &spec.plugins {
        payload.push_str(&format!("plugin={}\n", plugin));
    }
    for extension in &spec.extensions {
        payload.push_str(&format!("extension={}\n", extension));
    }
    payload.push_str(&format!("sha256={}\n", spec.sha256));
    payload
}

pub(crate) fn parse_spec_record(raw: &str) -> Result<InstalledSpec> {
    let mut name = None;
    let mut version = None;
    let mut platform = None;
    let mut executables = Vec::new();
    let mut plugins = Vec::new();
    let mut extensions = Vec::new();
    let mut sha256 = None;

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        match k {
            "name" => name = Some(v.to_string()),
            "version" => {
                version = Some(
                    Version::parse(v).with_context(|| format!("invalid spec version: {v}"))?,
                )
            }
            "platform" => platform = Some(v.to_string()),
            "executable" => executables.push(v.to_string()),
            "plugin" => plugins.push(v.to_string()),
            "extension" => extensions.push(v.to_string()),
            "sha256" => sha256 = Some(v.to_string()),
            _ => {}
        }
    }

    Ok(InstalledSpec {
        name: name.context("missing name")?,
        version: version.context("missing version")?,
        platform: platform.unwrap_or_default(),
        executables,
        plugins,
        extensions,
        sha256: sha256.context("missing sha256")?,
    })
}

pub fn write_installed_spec(layout: &InstallLayout, spec: &InstalledSpec) -> Result<PathBuf> {
    let dir = layout.specifications_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create specifications dir: {}", dir.display()))?;

    let path = layout.spec_path(&spec.full_name());
    fs::write(&path, serialize_spec_record(spec).as_bytes())
        .with_context(|| format!("failed to write installed spec: {}", path.display()))?;
    Ok(path)
}

pub fn write_cache_record(layout: &InstallLayout, spec: &InstalledSpec) -> Result<PathBuf> {
    let dir = layout.cache_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create cache dir: {}", dir.display()))?;

    let path = layout.cache_record_path(&spec.full_name());
    fs::write(&path, serialize_spec_record(spec).as_bytes())
        .with_context(|| format!("failed to write cache record: {}", path.display()))?;
    Ok(path)
}

pub fn read_installed_specs(layout: &InstallLayout) -> Result<Vec<InstalledSpec>> {
    let dir = layout.specifications_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut specs = Vec::new();
    for entry in fs::read_dir(&dir)
        .with_context(|| format!("failed to read specifications dir: {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|v| v.to_str()) != Some("spec") {
            continue;
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read installed spec: {}", path.display()))?;
        let spec = parse_spec_record(&raw)
            .with_context(|| format!("failed to parse installed spec: {}", path.display()))?;
        specs.push(spec);
    }

    specs.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.version.cmp(&b.version))
    });
    Ok(specs)
}
