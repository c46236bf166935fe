//! Pipeline orchestration and the run report.
//!
//! - [`checksum`] - SHA-256 of artifacts and payloads
//! - [`orchestrator`] - the [`Bundler`] running all stages
//! - [`tool_detection`] - optional packaging collaborators on this machine

pub(crate) mod checksum;
mod orchestrator;
pub(crate) mod tool_detection;

pub use orchestrator::Bundler;

use crate::bundler::modules::{ModuleSet, ResolutionSource};
use std::path::PathBuf;

/// The artifact a successful run produced, plus how it was made.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BundledArtifact {
    /// Final executable
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the executable
    pub sha256: String,
    /// Modules in the embedded runtime
    pub modules: ModuleSet,
    /// How the module set was determined
    pub module_source: ResolutionSource,
    /// JDK used for analysis and the image build
    pub jdk_home: PathBuf,
    /// Feature version of that JDK
    pub jdk_version: u32,
    /// Packaging collaborator that produced the executable
    pub packager: String,
}
