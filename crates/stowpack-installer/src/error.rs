use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Create,
    Write,
    Read,
}

impl AccessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("refusing to remove `{}` for {owner}: parent directory {} is world-writable without the sticky bit", path.display(), parent.display())]
    InsecureInstallPath {
        owner: String,
        path: PathBuf,
        parent: PathBuf,
    },

    #[error("could not delete previous installation of `{}` for {owner}", path.display())]
    DirectoryRemoval {
        owner: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("filesystem access denied: {mode} {}", path.display())]
    AccessDenied { mode: AccessMode, path: PathBuf },

    #[error("checksum mismatch for {name}: expected {expected}, computed {computed}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        computed: String,
    },
}

pub fn is_permission_denied(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io_err| io_err.kind() == io::ErrorKind::PermissionDenied)
    })
}
