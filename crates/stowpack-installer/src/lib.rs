mod access;
mod binstubs;
mod build_info;
mod error;
mod ext_cache;
mod fs_utils;
mod hooks;
mod install;
mod layout;
mod plugins;
mod secure_rm;
mod specs;
mod uninstall;

pub use access::with_access;
pub use binstubs::generate_executables;
pub use build_info::{read_build_info, write_build_info, BuildInfoEntry};
pub use error::{AccessMode, InstallError};
pub use ext_cache::{
    build_or_replay, extension_cache_key, ExtensionBuilder, BUILD_COMPLETE_MARKER,
};
pub use fs_utils::remove_file_if_exists;
pub use hooks::{InstallHooks, NoopHooks, WrapperSource};
pub use install::{
    probe_writable, verify_artifact_checksum, HostCapabilities, InstallOptions, InstallOutcome,
    Installer, PrecheckPolicy,
};
pub use layout::{default_user_root, host_platform_tag, InstallLayout};
pub use plugins::{generate_plugins, remove_plugins_for};
pub use secure_rm::remove_previous;
pub use specs::{
    read_installed_specs, serialize_spec_record, write_cache_record, write_installed_spec,
    InstalledSpec,
};
pub use uninstall::{uninstall_package, UninstallOutcome, UninstallStatus};
