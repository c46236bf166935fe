//! Toolchain location.
//!
//! Finds one JDK (version 9 or newer, with `jdeps` and `jlink`) to drive the
//! rest of the pipeline. An explicit override is validated on its own and
//! never falls back to auto-detection; otherwise the probes run in a fixed
//! order and the first eligible JDK wins.

pub mod jdk;
pub mod probes;

pub use jdk::JdkCandidate;
pub use probes::{EnvVarProbe, InstallDirProbe, JdkProbe, PathProbe, VersionManagerProbe};

use crate::bundler::{Error, Result};
use std::path::Path;

/// Ordered list of probe strategies.
pub struct JdkLocator {
    probes: Vec<Box<dyn JdkProbe>>,
}

impl std::fmt::Debug for JdkLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JdkLocator")
            .field(
                "probes",
                &self.probes.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for JdkLocator {
    fn default() -> Self {
        Self::with_probes(vec![
            Box::new(EnvVarProbe::new("JAVA_HOME")),
            Box::new(PathProbe),
            Box::new(VersionManagerProbe::default()),
            Box::new(InstallDirProbe::platform_default()),
        ])
    }
}

impl JdkLocator {
    /// Locator with the platform's default probes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locator that consults exactly `probes`, in order.
    pub fn with_probes(probes: Vec<Box<dyn JdkProbe>>) -> Self {
        Self { probes }
    }

    /// Returns the JDK to use.
    ///
    /// # Errors
    ///
    /// `ToolchainNotFound` when the override is unusable (with the specific
    /// reason) or when no probe finds an eligible JDK.
    pub fn locate(&self, override_path: Option<&Path>) -> Result<JdkCandidate> {
        if let Some(path) = override_path {
            return Self::validate_override(path);
        }

        for probe in &self.probes {
            log::debug!("Probing {} for a JDK", probe.name());
            if let Some(candidate) = probe.probe() {
                log::info!(
                    "Using JDK {} at {} (found via {})",
                    candidate.version,
                    candidate.installation_path.display(),
                    probe.name()
                );
                return Ok(candidate);
            }
        }

        let searched: Vec<&str> = self.probes.iter().map(|p| p.name()).collect();
        Err(Error::ToolchainNotFound {
            reason: format!(
                "no JDK {}+ with jdeps and jlink found (searched: {}); install one or pass --jdk",
                jdk::MIN_JDK_VERSION,
                searched.join(", ")
            ),
        })
    }

    fn validate_override(path: &Path) -> Result<JdkCandidate> {
        let candidate =
            jdk::inspect(path).map_err(|reason| Error::ToolchainNotFound { reason })?;
        match candidate.ineligibility() {
            Some(reason) => Err(Error::ToolchainNotFound { reason }),
            None => {
                log::info!(
                    "Using JDK {} at {} (explicit override)",
                    candidate.version,
                    candidate.installation_path.display()
                );
                Ok(candidate)
            }
        }
    }
}
