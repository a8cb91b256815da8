use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub fn host_platform_tag() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
    platform: String,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            platform: host_platform_tag(),
        }
    }

    pub fn with_platform(root: impl Into<PathBuf>, platform: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            platform: platform.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn pkgs_dir(&self) -> PathBuf {
        self.root.join("pkgs")
    }

    pub fn package_dir(&self, full_name: &str) -> PathBuf {
        self.pkgs_dir().join(full_name)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn bin_path(&self, executable: &str) -> PathBuf {
        let mut file_name = executable.to_string();
        if cfg!(windows) {
            file_name.push_str(".cmd");
        }
        self.bin_dir().join(file_name)
    }

    pub fn specifications_dir(&self) -> PathBuf {
        self.root.join("specifications")
    }

    pub fn spec_path(&self, full_name: &str) -> PathBuf {
        self.specifications_dir().join(format!("{full_name}.spec"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn cache_record_path(&self, full_name: &str) -> PathBuf {
        self.cache_dir().join(format!("{full_name}.pkg"))
    }

    pub fn extension_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("extensions")
    }

    pub fn extensions_dir(&self) -> PathBuf {
        self.root.join("extensions").join(&self.platform)
    }

    pub fn extension_dir(&self, full_name: &str) -> PathBuf {
        self.extensions_dir().join(full_name)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join("plugins")
    }

    pub fn plugin_path(&self, package: &str, plugin: &str) -> PathBuf {
        self.plugins_dir().join(format!("{package}--{plugin}.plugin"))
    }

    pub fn build_info_dir(&self) -> PathBuf {
        self.root.join("build_info")
    }

    pub fn build_info_path(&self, full_name: &str) -> PathBuf {
        self.build_info_dir().join(format!("{full_name}.info"))
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            self.pkgs_dir(),
            self.bin_dir(),
            self.specifications_dir(),
            self.cache_dir(),
            self.extension_cache_dir(),
            self.extensions_dir(),
            self.plugins_dir(),
            self.build_info_dir(),
            self.tmp_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn default_user_root() -> Result<PathBuf> {
    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve Windows user root")?;
        return Ok(PathBuf::from(app_data).join("Stowpack"));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve user root")?;
    Ok(PathBuf::from(home).join(".stowpack"))
}
