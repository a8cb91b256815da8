use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use clap::CommandFactory;
use serde::Serialize;
use stowpack_core::{load_artifact, ExecutableSpec, ExtensionUnit, PackageArtifact, PluginSpec};
use stowpack_installer::{
    default_user_root, read_installed_specs, uninstall_package, ExtensionBuilder,
    HostCapabilities, InstallLayout, InstallOptions, InstallOutcome, Installer, NoopHooks,
    PrecheckPolicy, UninstallStatus, WrapperSource,
};

use crate::render::{print_status, print_warning};
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Install {
            path,
            force_rebuild,
            no_extension_cache,
            strict_precheck,
            no_plugins,
        } => {
            let layout = resolve_layout(cli.root)?;
            let artifact = load_artifact(&path)
                .with_context(|| format!("failed to load package from {}", path.display()))?;

            let options = InstallOptions {
                force_rebuild,
                precheck: if strict_precheck {
                    PrecheckPolicy::Strict
                } else {
                    PrecheckPolicy::Lenient
                },
                capabilities: HostCapabilities {
                    supports_plugins: !no_plugins,
                },
                extension_cache_dir: if no_extension_cache {
                    None
                } else {
                    Some(layout.extension_cache_dir())
                },
                ..InstallOptions::default()
            };

            let outcome = run_install(&layout, &artifact, options)?;
            print_status(
                "installed",
                &format!(
                    "{} (sha256 {})",
                    outcome.spec.full_name(),
                    &outcome.checksum[..12.min(outcome.checksum.len())]
                ),
            );
            for warning in &outcome.warnings {
                print_warning(warning);
            }
            if let Some(message) = &outcome.post_install_message {
                println!("{message}");
            }
        }
        Commands::Uninstall { name } => {
            let layout = resolve_layout(cli.root)?;
            let outcome = uninstall_package(&layout, &name)?;
            match outcome.status {
                UninstallStatus::NotInstalled => {
                    println!("No package installed: {name}");
                }
                UninstallStatus::Uninstalled => {
                    for version in &outcome.removed_versions {
                        print_status("removed", &format!("{name}-{version}"));
                    }
                }
                UninstallStatus::RepairedStaleState => {
                    print_status("repaired", &format!("stale records for {name}"));
                }
            }
        }
        Commands::List { json } => {
            let layout = resolve_layout(cli.root)?;
            let specs = read_installed_specs(&layout)?;
            if json {
                let entries: Vec<ListEntry> = specs.iter().map(ListEntry::from_spec).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&entries)
                        .context("failed to render installed packages as json")?
                );
            } else if specs.is_empty() {
                println!("No packages installed");
            } else {
                for spec in &specs {
                    println!("{} {} ({})", spec.name, spec.version, spec.platform);
                }
            }
        }
        Commands::Doctor => {
            let layout = resolve_layout(cli.root)?;
            let specs = read_installed_specs(&layout)?;
            println!("root: {}", layout.root().display());
            println!("bin: {}", layout.bin_dir().display());
            println!("cache: {}", layout.cache_dir().display());
            println!("platform: {}", layout.platform());
            println!("installed: {}", specs.len());
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "stowpack", &mut io::stdout());
        }
    }
    Ok(())
}

pub(crate) fn resolve_layout(root: Option<PathBuf>) -> Result<InstallLayout> {
    let root = match root {
        Some(root) => root,
        None => default_user_root()?,
    };
    Ok(InstallLayout::new(root))
}

pub(crate) fn run_install(
    layout: &InstallLayout,
    artifact: &PackageArtifact,
    options: InstallOptions,
) -> Result<InstallOutcome> {
    let builder = ProcessExtensionBuilder;
    let wrappers = ShWrapperSource::new(layout.clone());
    let installer = Installer::new(layout, &builder, &NoopHooks, &wrappers, options);
    installer.install(artifact)
}

#[derive(Debug, Serialize)]
pub(crate) struct ListEntry {
    name: String,
    version: String,
    platform: String,
    sha256: String,
    executables: Vec<String>,
}

impl ListEntry {
    fn from_spec(spec: &stowpack_installer::InstalledSpec) -> Self {
        Self {
            name: spec.name.clone(),
            version: spec.version.to_string(),
            platform: spec.platform.clone(),
            sha256: spec.sha256.clone(),
            executables: spec.executables.clone(),
        }
    }
}

/// Builds a native extension by spawning the unit's declared build command
/// in the extracted source directory. The output directory is handed to the
/// command through `STOWPACK_EXT_OUTPUT`.
pub(crate) struct ProcessExtensionBuilder;

impl ExtensionBuilder for ProcessExtensionBuilder {
    fn build(&self, unit: &ExtensionUnit, source_dir: &Path, output_dir: &Path) -> Result<()> {
        let Some((program, args)) = unit.build_args.split_first() else {
            return Err(anyhow!("extension '{}' declares no build command", unit.name));
        };

        let output = Command::new(program)
            .args(args)
            .current_dir(source_dir)
            .env("STOWPACK_EXT_OUTPUT", output_dir)
            .output()
            .with_context(|| {
                format!("failed to start build command for extension '{}'", unit.name)
            })?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        Err(anyhow!(
            "extension '{}' build failed: status={} stdout='{}' stderr='{}'",
            unit.name,
            output.status,
            stdout.trim(),
            stderr.trim()
        ))
    }
}

/// Wrapper scripts exec the installed entry point in place.
pub(crate) struct ShWrapperSource {
    layout: InstallLayout,
}

impl ShWrapperSource {
    pub(crate) fn new(layout: InstallLayout) -> Self {
        Self { layout }
    }

    fn entry_path(&self, artifact: &PackageArtifact, entry: &str) -> PathBuf {
        self.layout.package_dir(&artifact.full_name()).join(entry)
    }
}

impl WrapperSource for ShWrapperSource {
    fn executable_text(&self, artifact: &PackageArtifact, executable: &ExecutableSpec) -> String {
        let target = self.entry_path(artifact, &executable.entry);
        if cfg!(windows) {
            format!("@echo off\r\n\"{}\" %*\r\n", target.display())
        } else {
            format!("#!/bin/sh\nexec \"{}\" \"$@\"\n", target.display())
        }
    }

    fn plugin_text(&self, artifact: &PackageArtifact, plugin: &PluginSpec) -> String {
        format!(
            "package={}\nversion={}\nentry={}\n",
            artifact.name,
            artifact.version,
            self.entry_path(artifact, &plugin.entry).display()
        )
    }
}
