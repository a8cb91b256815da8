mod artifact;
mod manifest;

pub use artifact::{
    validated_relative_path, ExecutableSpec, ExtensionUnit, PackageArtifact, PayloadEntry,
    PluginSpec,
};
pub use manifest::{build_artifact, load_artifact, ManifestFile, PackageManifest, MANIFEST_FILE_NAME};
