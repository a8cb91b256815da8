use stowpack_core::{ExecutableSpec, PackageArtifact, PluginSpec};

/// Observation points around the install sequence. Hook failures are the
/// hook's own problem; the pipeline neither sees nor reacts to them.
pub trait InstallHooks {
    fn pre_install(&self, _artifact: &PackageArtifact) {}
    fn post_build(&self, _artifact: &PackageArtifact) {}
    fn post_install(&self, _artifact: &PackageArtifact) {}
}

pub struct NoopHooks;

impl InstallHooks for NoopHooks {}

/// Supplies the textual content of generated launcher and plugin files.
pub trait WrapperSource {
    fn executable_text(&self, artifact: &PackageArtifact, executable: &ExecutableSpec) -> String;
    fn plugin_text(&self, artifact: &PackageArtifact, plugin: &PluginSpec) -> String;
}
