use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::InstallError;

/// Deletes a previous install subtree, refusing when the parent directory
/// permission state would make the removal exploitable by a co-tenant.
pub fn remove_previous(path: &Path, owner: &str) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if is_empty_dir(path)? {
        return Ok(());
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_secure_parent(parent, path, owner)?;

    match remove_tree_no_follow(path) {
        Ok(()) => Ok(()),
        // another remover finishing first is not a failure
        Err(_) if !path.exists() => Ok(()),
        Err(err) => Err(InstallError::DirectoryRemoval {
            owner: owner.to_string(),
            path: path.to_path_buf(),
            source: err,
        }
        .into()),
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let metadata = fs::symlink_metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    if !metadata.is_dir() {
        return Ok(false);
    }
    let mut entries =
        fs::read_dir(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(entries.next().is_none())
}

#[cfg(unix)]
fn ensure_secure_parent(parent: &Path, path: &Path, owner: &str) -> Result<()> {
    use std::os::unix::fs::MetadataExt;

    let parent_metadata = fs::metadata(parent)
        .with_context(|| format!("failed to stat parent directory {}", parent.display()))?;
    let mode = parent_metadata.mode();
    if mode & 0o002 != 0 && mode & 0o1000 == 0 {
        return Err(InstallError::InsecureInstallPath {
            owner: owner.to_string(),
            path: path.to_path_buf(),
            parent: parent.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_secure_parent(_parent: &Path, _path: &Path, _owner: &str) -> Result<()> {
    Ok(())
}

// Walks with symlink_metadata so links are unlinked in place, never
// followed out of the subtree being deleted.
fn remove_tree_no_follow(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.file_type().is_symlink() || !metadata.is_dir() {
        return fs::remove_file(path);
    }
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        remove_tree_no_follow(&entry.path())?;
    }
    fs::remove_dir(path)
}
