use std::path::Path;

use anyhow::Result;

use crate::error::{is_permission_denied, AccessMode, InstallError};

/// Runs `op` against `path`, folding every flavor of permission denial the
/// operating system may produce into one `InstallError::AccessDenied`
/// carrying the path and the attempted access mode. Other errors pass
/// through untouched.
pub fn with_access<T>(
    path: &Path,
    mode: AccessMode,
    op: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    match op(path) {
        Ok(value) => Ok(value),
        Err(err) if is_permission_denied(&err) => Err(InstallError::AccessDenied {
            mode,
            path: path.to_path_buf(),
        }
        .into()),
        Err(err) => Err(err),
    }
}
