//! The immutable packaging request.

use super::{ConsoleMode, PackagerKind, TargetPlatform};
use crate::bundler::{Error, Result};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    time::Duration,
};

/// Kind of input archive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// Plain or executable JAR
    Jar,
    /// Web application archive
    War,
}

impl ArchiveKind {
    /// Determines the kind from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("jar") => Ok(Self::Jar),
            Some("war") => Ok(Self::War),
            _ => Err(Error::InvalidArchive {
                path: path.to_path_buf(),
                reason: "only JAR and WAR files are supported".into(),
            }),
        }
    }
}

/// Time limits for the blocking external tool calls.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timeouts {
    /// Dependency analysis (jdeps, java --list-modules)
    pub analysis: Duration,
    /// Runtime image build (jlink)
    pub image: Duration,
    /// Final packaging collaborator
    pub package: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            analysis: Duration::from_secs(120),
            image: Duration::from_secs(600),
            package: Duration::from_secs(1200),
        }
    }
}

/// Everything a pipeline run needs to know, fixed before the run starts.
///
/// Constructed through [`RequestBuilder`](super::RequestBuilder); read-only afterwards.
#[derive(Clone, Debug)]
pub struct PackagingRequest {
    pub(super) archive_path: PathBuf,
    pub(super) archive_kind: ArchiveKind,
    pub(super) output_name: String,
    pub(super) output_dir: PathBuf,
    pub(super) target_platform: TargetPlatform,
    pub(super) jdk_override: Option<PathBuf>,
    pub(super) extra_modules: BTreeSet<String>,
    pub(super) all_modules: bool,
    pub(super) packager: PackagerKind,
    pub(super) console: ConsoleMode,
    pub(super) icon: Option<PathBuf>,
    pub(super) main_class: Option<String>,
    pub(super) war_runner: Option<PathBuf>,
    pub(super) jvm_args: Vec<String>,
    pub(super) strip_debug: bool,
    pub(super) work_dir: PathBuf,
    pub(super) timeouts: Timeouts,
}

impl PackagingRequest {
    /// Absolute path of the input archive.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// JAR or WAR.
    pub fn archive_kind(&self) -> ArchiveKind {
        self.archive_kind
    }

    /// File name of the archive inside the staging tree.
    pub fn archive_file_name(&self) -> String {
        self.archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app.jar".to_string())
    }

    /// Base name of the artifact (without platform suffix).
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Directory receiving the artifact.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Deterministic artifact location derived from name and platform.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(self.target_platform.artifact_file_name(&self.output_name))
    }

    /// Platform the artifact is built for.
    pub fn target_platform(&self) -> TargetPlatform {
        self.target_platform
    }

    /// Explicit JDK location, disabling auto-detection.
    pub fn jdk_override(&self) -> Option<&Path> {
        self.jdk_override.as_deref()
    }

    /// User-requested modules merged into the analysed set.
    pub fn extra_modules(&self) -> &BTreeSet<String> {
        &self.extra_modules
    }

    /// Include every module of the JDK instead of analysing.
    pub fn all_modules(&self) -> bool {
        self.all_modules
    }

    /// Packaging collaborator selection.
    pub fn packager(&self) -> PackagerKind {
        self.packager
    }

    /// Console or windowed artifact.
    pub fn console(&self) -> ConsoleMode {
        self.console
    }

    /// Icon for the artifact, if any.
    pub fn icon(&self) -> Option<&Path> {
        self.icon.as_deref()
    }

    /// Main class overriding the manifest's `Main-Class`.
    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    /// Servlet container runner JAR bundled next to a WAR.
    pub fn war_runner(&self) -> Option<&Path> {
        self.war_runner.as_deref()
    }

    /// Arguments passed to the JVM before the application.
    pub fn jvm_args(&self) -> &[String] {
        &self.jvm_args
    }

    /// Pass `--strip-debug` to jlink.
    pub fn strip_debug(&self) -> bool {
        self.strip_debug
    }

    /// Base directory under which per-run staging directories are created.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Limits for external tools.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }
}
