use std::fs;

use anyhow::{Context, Result};
use stowpack_core::PackageArtifact;

use crate::hooks::WrapperSource;
use crate::layout::InstallLayout;
use crate::specs::InstalledSpec;

/// Regenerates plugin registrations for the artifact, unless a strictly
/// newer installed version of the same package already owns them. An
/// artifact that declares no plugins clears its previous registrations.
pub fn generate_plugins(
    layout: &InstallLayout,
    artifact: &PackageArtifact,
    wrappers: &dyn WrapperSource,
    installed: &[InstalledSpec],
) -> Result<()> {
    let newest_active = installed
        .iter()
        .filter(|spec| spec.name == artifact.name)
        .map(|spec| &spec.version)
        .max();
    if let Some(active) = newest_active {
        if *active > artifact.version {
            return Ok(());
        }
    }

    let dir = layout.plugins_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create plugins dir: {}", dir.display()))?;

    remove_plugins_for(layout, &artifact.name)?;
    for plugin in &artifact.plugins {
        let path = layout.plugin_path(&artifact.name, &plugin.name);
        fs::write(&path, wrappers.plugin_text(artifact, plugin).as_bytes())
            .with_context(|| format!("failed to write plugin registration: {}", path.display()))?;
    }
    Ok(())
}

pub fn remove_plugins_for(layout: &InstallLayout, package: &str) -> Result<()> {
    let dir = layout.plugins_dir();
    if !dir.exists() {
        return Ok(());
    }

    let prefix = format!("{package}--");
    for entry in fs::read_dir(&dir)
        .with_context(|| format!("failed to read plugins dir: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|v| v.to_str()) else {
            continue;
        };
        if file_name.starts_with(&prefix) && file_name.ends_with(".plugin") {
            fs::remove_file(&path).with_context(|| {
                format!("failed to remove plugin registration: {}", path.display())
            })?;
        }
    }
    Ok(())
}
