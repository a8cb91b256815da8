use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use stowpack_core::ExtensionUnit;

use crate::fs_utils::copy_dir_recursive;

pub const BUILD_COMPLETE_MARKER: &str = "pkg.build_complete";

pub trait ExtensionBuilder {
    fn build(&self, unit: &ExtensionUnit, source_dir: &Path, output_dir: &Path) -> Result<()>;
}

pub fn extension_cache_key(unit: &ExtensionUnit) -> String {
    let mut seed = String::new();
    seed.push_str(&unit.name);
    seed.push('\n');
    seed.push_str(&unit.source_dir);
    seed.push('\n');
    for arg in &unit.build_args {
        seed.push_str(arg);
        seed.push('\n');
    }
    stowpack_security::sha256_hex(seed.as_bytes())
}

/// Replays a completed cached build into `output_dir`, or performs the real
/// build and populates the cache. Build failures propagate unmodified;
/// cache-population failures are returned as warnings because the build
/// output in `output_dir` is already good.
pub fn build_or_replay(
    builder: &dyn ExtensionBuilder,
    unit: &ExtensionUnit,
    source_dir: &Path,
    cache_root: Option<&Path>,
    output_dir: &Path,
    force_rebuild: bool,
) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create extension output dir: {}", output_dir.display()))?;

    let Some(cache_root) = cache_root else {
        builder.build(unit, source_dir, output_dir)?;
        write_marker(output_dir)?;
        return Ok(warnings);
    };

    let marker = cache_root.join(BUILD_COMPLETE_MARKER);
    if !force_rebuild && marker.exists() {
        copy_dir_recursive(cache_root, output_dir).with_context(|| {
            format!(
                "failed to replay cached extension build from {}",
                cache_root.display()
            )
        })?;
        return Ok(warnings);
    }

    builder.build(unit, source_dir, output_dir)?;
    write_marker(output_dir)?;

    if let Err(err) = populate_cache(cache_root, output_dir) {
        warnings.push(format!(
            "failed to cache extension build for '{}': {err:#}",
            unit.name
        ));
    }
    Ok(warnings)
}

fn write_marker(output_dir: &Path) -> Result<()> {
    fs::write(output_dir.join(BUILD_COMPLETE_MARKER), b"").with_context(|| {
        format!(
            "failed to write build-complete marker under {}",
            output_dir.display()
        )
    })
}

// The staged copy carries the completion marker, so the marker and the
// tree become visible in a single rename. A reader can never see the
// marker over a half-copied tree.
fn populate_cache(cache_root: &Path, output_dir: &Path) -> Result<()> {
    let parent = cache_root
        .parent()
        .ok_or_else(|| anyhow!("extension cache root has no parent: {}", cache_root.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let staging = sibling_tmp_path(parent, cache_root, "staging")?;
    if staging.exists() {
        let _ = fs::remove_dir_all(&staging);
    }
    copy_dir_recursive(output_dir, &staging)?;

    if cache_root.exists() {
        let displaced = sibling_tmp_path(parent, cache_root, "displaced")?;
        fs::rename(cache_root, &displaced).with_context(|| {
            format!(
                "failed to displace previous cache entry: {}",
                cache_root.display()
            )
        })?;
        let _ = fs::remove_dir_all(&displaced);
    }

    match fs::rename(&staging, cache_root) {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = fs::remove_dir_all(&staging);
            // lost a populate race; the winner's entry is complete
            if cache_root.join(BUILD_COMPLETE_MARKER).exists() {
                Ok(())
            } else {
                Err(err).with_context(|| {
                    format!("failed to publish cache entry: {}", cache_root.display())
                })
            }
        }
    }
}

fn sibling_tmp_path(parent: &Path, cache_root: &Path, label: &str) -> Result<PathBuf> {
    let file_name = cache_root
        .file_name()
        .and_then(|value| value.to_str())
        .ok_or_else(|| anyhow!("invalid cache root name: {}", cache_root.display()))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_nanos();
    Ok(parent.join(format!(
        ".{}.{}-{}-{}",
        file_name,
        label,
        std::process::id(),
        nanos
    )))
}
