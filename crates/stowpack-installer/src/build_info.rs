use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use stowpack_core::ExtensionUnit;

use crate::layout::InstallLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfoEntry {
    pub extension: String,
    pub build_args: Vec<String>,
}

pub fn write_build_info(
    layout: &InstallLayout,
    full_name: &str,
    units: &[ExtensionUnit],
) -> Result<PathBuf> {
    let dir = layout.build_info_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create build_info dir: {}", dir.display()))?;

    let mut payload = String::new();
    for unit in units {
        payload.push_str(&format!("extension={}\n", unit.name));
        for arg in &unit.build_args {
            if arg.contains('\n') {
                return Err(anyhow!("build args must not contain newlines"));
            }
            payload.push_str(&format!("build_arg={}\t{}\n", unit.name, arg));
        }
    }

    let path = layout.build_info_path(full_name);
    fs::write(&path, payload.as_bytes())
        .with_context(|| format!("failed to write build info: {}", path.display()))?;
    Ok(path)
}

pub fn read_build_info(layout: &InstallLayout, full_name: &str) -> Result<Vec<BuildInfoEntry>> {
    let path = layout.build_info_path(full_name);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read build info: {}", path.display()))?;

    let mut entries: Vec<BuildInfoEntry> = Vec::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(name) = line.strip_prefix("extension=") {
            entries.push(BuildInfoEntry {
                extension: name.to_string(),
                build_args: Vec::new(),
            });
            continue;
        }
        if let Some(payload) = line.strip_prefix("build_arg=") {
            let Some((name, arg)) = payload.split_once('\t') else {
                return Err(anyhow!("invalid build info row: {line}"));
            };
            let Some(entry) = entries
                .iter_mut()
                .rev()
                .find(|entry| entry.extension == name)
            else {
                return Err(anyhow!("build arg for undeclared extension: {name}"));
            };
            entry.build_args.push(arg.to_string());
        }
    }
    Ok(entries)
}
