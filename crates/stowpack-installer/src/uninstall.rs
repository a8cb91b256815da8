use std::fs;

use anyhow::{Context, Result};
use semver::Version;

use crate::fs_utils::remove_file_if_exists;
use crate::layout::InstallLayout;
use crate::plugins::remove_plugins_for;
use crate::secure_rm::remove_previous;
use crate::specs::{read_installed_specs, InstalledSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallStatus {
    NotInstalled,
    Uninstalled,
    RepairedStaleState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallOutcome {
    pub name: String,
    pub removed_versions: Vec<Version>,
    pub status: UninstallStatus,
}

/// Removes every installed version of `name`: payload, built extensions,
/// generated wrappers, plugin registrations, spec and cache records. A
/// spec record without payload on disk is repaired rather than failed.
pub fn uninstall_package(layout: &InstallLayout, name: &str) -> Result<UninstallOutcome> {
    let specs: Vec<InstalledSpec> = read_installed_specs(layout)?
        .into_iter()
        .filter(|spec| spec.name == name)
        .collect();

    if specs.is_empty() {
        return Ok(UninstallOutcome {
            name: name.to_string(),
            removed_versions: Vec::new(),
            status: UninstallStatus::NotInstalled,
        });
    }

    let mut any_payload_removed = false;
    let mut removed_versions = Vec::with_capacity(specs.len());
    for spec in &specs {
        let full_name = spec.full_name();

        let package_dir = layout.package_dir(&full_name);
        if package_dir.exists() {
            any_payload_removed = true;
        }
        remove_previous(&package_dir, &full_name)?;
        let _ = fs::remove_dir(&package_dir);

        let extension_dir = layout.extension_dir(&full_name);
        remove_previous(&extension_dir, &full_name)?;
        let _ = fs::remove_dir(&extension_dir);

        for executable in &spec.executables {
            let bin_path = layout.bin_path(executable);
            remove_file_if_exists(&bin_path)
                .with_context(|| format!("failed to remove wrapper: {}", bin_path.display()))?;
        }

        let build_info_path = layout.build_info_path(&full_name);
        remove_file_if_exists(&build_info_path).with_context(|| {
            format!("failed to remove build info: {}", build_info_path.display())
        })?;

        let cache_record = layout.cache_record_path(&full_name);
        remove_file_if_exists(&cache_record)
            .with_context(|| format!("failed to remove cache record: {}", cache_record.display()))?;

        let spec_path = layout.spec_path(&full_name);
        remove_file_if_exists(&spec_path)
            .with_context(|| format!("failed to remove installed spec: {}", spec_path.display()))?;

        removed_versions.push(spec.version.clone());
    }

    remove_plugins_for(layout, name)?;

    Ok(UninstallOutcome {
        name: name.to_string(),
        removed_versions,
        status: if any_payload_removed {
            UninstallStatus::Uninstalled
        } else {
            UninstallStatus::RepairedStaleState
        },
    })
}
