use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use stowpack_core::{ExecutableSpec, PackageArtifact};

use crate::fs_utils::{remove_file_if_exists, write_file_atomic};
use crate::hooks::WrapperSource;
use crate::layout::InstallLayout;

pub fn generate_executables(
    layout: &InstallLayout,
    artifact: &PackageArtifact,
    wrappers: &dyn WrapperSource,
    prog_mode: u32,
) -> Result<()> {
    if artifact.executables.is_empty() {
        return Ok(());
    }

    let bin_dir = layout.bin_dir();
    fs::create_dir_all(&bin_dir)
        .with_context(|| format!("failed to create bin dir: {}", bin_dir.display()))?;

    for executable in &artifact.executables {
        generate_one_executable(layout, artifact, executable, wrappers, prog_mode)?;
    }
    Ok(())
}

fn generate_one_executable(
    layout: &InstallLayout,
    artifact: &PackageArtifact,
    executable: &ExecutableSpec,
    wrappers: &dyn WrapperSource,
    prog_mode: u32,
) -> Result<()> {
    let bin_path = layout.bin_path(&executable.name);
    let lock_path = layout.bin_dir().join(format!(".{}.lock", executable.name));

    // advisory lock scoped to this wrapper path; concurrent installs of
    // packages sharing an executable name serialize here
    let lock_file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open wrapper lock: {}", lock_path.display()))?;
    lock_file
        .lock_exclusive()
        .with_context(|| format!("failed to lock wrapper path: {}", bin_path.display()))?;

    let result = write_wrapper(
        &bin_path,
        &wrappers.executable_text(artifact, executable),
        prog_mode,
    );

    let _ = lock_file.unlock();
    result
}

fn write_wrapper(bin_path: &Path, text: &str, mode: u32) -> Result<()> {
    // a prior install may have used a different wrapper style
    remove_file_if_exists(bin_path)
        .with_context(|| format!("failed to remove stale wrapper: {}", bin_path.display()))?;
    write_file_atomic(bin_path, text.as_bytes(), Some(mode))
        .with_context(|| format!("failed to write wrapper: {}", bin_path.display()))
}
