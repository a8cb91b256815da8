use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stowpack_core::{validated_relative_path, PackageArtifact};

use crate::access::with_access;
use crate::binstubs::generate_executables;
use crate::build_info::write_build_info;
use crate::error::{AccessMode, InstallError};
use crate::ext_cache::{build_or_replay, extension_cache_key, ExtensionBuilder};
use crate::hooks::{InstallHooks, WrapperSource};
use crate::layout::InstallLayout;
use crate::plugins::generate_plugins;
use crate::secure_rm::remove_previous;
use crate::specs::{read_installed_specs, write_cache_record, write_installed_spec, InstalledSpec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrecheckPolicy {
    /// Writability probe failures are ignored; the later real write
    /// attempt is authoritative.
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    pub supports_plugins: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            supports_plugins: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub force_rebuild: bool,
    pub prog_mode: u32,
    pub precheck: PrecheckPolicy,
    pub capabilities: HostCapabilities,
    pub extension_cache_dir: Option<PathBuf>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            force_rebuild: false,
            prog_mode: 0o755,
            precheck: PrecheckPolicy::default(),
            capabilities: HostCapabilities::default(),
            extension_cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub spec: InstalledSpec,
    pub checksum: String,
    pub post_install_message: Option<String>,
    pub warnings: Vec<String>,
}

pub struct Installer<'a> {
    layout: &'a InstallLayout,
    builder: &'a dyn ExtensionBuilder,
    hooks: &'a dyn InstallHooks,
    wrappers: &'a dyn WrapperSource,
    options: InstallOptions,
}

impl<'a> Installer<'a> {
    pub fn new(
        layout: &'a InstallLayout,
        builder: &'a dyn ExtensionBuilder,
        hooks: &'a dyn InstallHooks,
        wrappers: &'a dyn WrapperSource,
        options: InstallOptions,
    ) -> Self {
        Self {
            layout,
            builder,
            hooks,
            wrappers,
            options,
        }
    }

    pub fn options(&self) -> &InstallOptions {
        &self.options
    }

    /// Runs the full install sequence. Stages are strictly sequential; a
    /// fatal stage failure aborts the rest with no rollback, relying on the
    /// purge-then-extract stages being safely re-runnable.
    pub fn install(&self, artifact: &PackageArtifact) -> Result<InstallOutcome> {
        artifact.validate()?;
        let full_name = artifact.full_name();
        let mut warnings = Vec::new();

        self.hooks.pre_install(artifact);
        self.run_prechecks()?;

        let checksum = verify_artifact_checksum(artifact)?;

        let package_dir = self.layout.package_dir(&full_name);
        let extension_dir = self.layout.extension_dir(&full_name);
        remove_previous(&package_dir, &full_name)?;
        remove_previous(&extension_dir, &full_name)?;

        with_access(&package_dir, AccessMode::Create, |dir| {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create package dir: {}", dir.display()))
        })?;

        with_access(&package_dir, AccessMode::Write, |dir| {
            extract_entries(artifact, dir)
        })?;

        if !artifact.extensions.is_empty() {
            for unit in &artifact.extensions {
                let source_dir = package_dir.join(&unit.source_dir);
                let cache_root = self
                    .options
                    .extension_cache_dir
                    .as_ref()
                    .map(|dir| dir.join(extension_cache_key(unit)));
                let unit_warnings = build_or_replay(
                    self.builder,
                    unit,
                    &source_dir,
                    cache_root.as_deref(),
                    &extension_dir,
                    self.options.force_rebuild,
                )?;
                warnings.extend(unit_warnings);
            }
            write_build_info(self.layout, &full_name, &artifact.extensions)?;
            self.hooks.post_build(artifact);
        }

        with_access(&self.layout.bin_dir(), AccessMode::Write, |_| {
            generate_executables(self.layout, artifact, self.wrappers, self.options.prog_mode)
        })?;

        if self.options.capabilities.supports_plugins {
            let installed = read_installed_specs(self.layout)?;
            generate_plugins(self.layout, artifact, self.wrappers, &installed)?;
        }

        let spec = InstalledSpec {
            name: artifact.name.clone(),
            version: artifact.version.clone(),
            platform: self.layout.platform().to_string(),
            executables: artifact
                .executables
                .iter()
                .map(|executable| executable.name.clone())
                .collect(),
            plugins: artifact.plugins.iter().map(|plugin| plugin.name.clone()).collect(),
            extensions: artifact
                .extensions
                .iter()
                .map(|extension| extension.name.clone())
                .collect(),
            sha256: checksum.clone(),
        };
        write_installed_spec(self.layout, &spec)?;

        let cache_write = with_access(&self.layout.cache_dir(), AccessMode::Write, |_| {
            write_cache_record(self.layout, &spec).map(|_| ())
        });
        if let Err(err) = cache_write {
            warnings.push(format!("failed to write cache record for {full_name}: {err:#}"));
        }

        self.hooks.post_install(artifact);

        Ok(InstallOutcome {
            spec,
            checksum,
            post_install_message: artifact.post_install_message.clone(),
            warnings,
        })
    }

    fn run_prechecks(&self) -> Result<()> {
        for dir in [self.layout.root().to_path_buf(), self.layout.bin_dir()] {
            if probe_writable(&dir) {
                continue;
            }
            match self.options.precheck {
                PrecheckPolicy::Lenient => {}
                PrecheckPolicy::Strict => {
                    return Err(InstallError::AccessDenied {
                        mode: AccessMode::Write,
                        path: dir,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

pub fn verify_artifact_checksum(artifact: &PackageArtifact) -> Result<String> {
    let computed = stowpack_security::sha256_hex(&artifact.payload_bytes());
    if computed != artifact.expected_sha256 {
        return Err(InstallError::ChecksumMismatch {
            name: artifact.full_name(),
            expected: artifact.expected_sha256.clone(),
            computed,
        }
        .into());
    }
    Ok(computed)
}

/// Best-effort writability probe over the nearest existing ancestor. The
/// answer is allowed to be wrong; only the real write attempt decides.
pub fn probe_writable(path: &Path) -> bool {
    let mut current = path;
    loop {
        match fs::metadata(current) {
            Ok(metadata) => return !metadata.permissions().readonly(),
            Err(_) => match current.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => current = parent,
                _ => return true,
            },
        }
    }
}

fn extract_entries(artifact: &PackageArtifact, package_dir: &Path) -> Result<()> {
    for entry in &artifact.entries {
        let relative = validated_relative_path(&entry.path)?;
        let destination = package_dir.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&destination, &entry.data)
            .with_context(|| format!("failed to extract {}", destination.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&destination, fs::Permissions::from_mode(entry.mode))
                .with_context(|| format!("failed to set mode on {}", destination.display()))?;
        }
    }
    Ok(())
}
