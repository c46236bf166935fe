//! Per-run staging tree.

use super::launcher::{LauncherFlavor, RUNNER_DIR, RUNTIME_DIR, runner_path};
use crate::bundler::{ErrorExt, PackagingRequest, Result, cleanup::CleanupManager};
use std::path::{Path, PathBuf};

/// Prefix of every staging directory name.
pub const STAGING_PREFIX: &str = "jarpack-";

/// Paths of one run's staging tree.
///
/// ```text
/// <work_dir>/jarpack-<uuid>/
///   bundle/             packaged into the artifact
///     runtime/          jlink output (created by jlink)
///     <archive>
///     runner/<runner>   WAR runner, when configured
///     launcher.{sh,py}
///   analysis/           extracted WAR contents
///   build/              packager scratch space
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLayout {
    root: PathBuf,
    bundle: PathBuf,
    runtime: PathBuf,
    archive_copy: PathBuf,
    runner_copy: Option<PathBuf>,
    launcher_stub: PathBuf,
    analysis: PathBuf,
    build: PathBuf,
}

impl StagingLayout {
    /// Layout under a fresh, uniquely named directory in the request's work dir.
    pub fn for_request(request: &PackagingRequest, flavor: LauncherFlavor) -> Self {
        let root = request
            .work_dir()
            .join(format!("{STAGING_PREFIX}{}", uuid::Uuid::new_v4().simple()));
        Self::under(root, request, flavor)
    }

    /// Layout rooted at `root`.
    pub fn under(root: PathBuf, request: &PackagingRequest, flavor: LauncherFlavor) -> Self {
        let bundle = root.join("bundle");
        Self {
            runtime: bundle.join(RUNTIME_DIR),
            archive_copy: bundle.join(request.archive_file_name()),
            runner_copy: runner_path(request).map(|relative| bundle.join(relative)),
            launcher_stub: bundle.join(flavor.file_name()),
            analysis: root.join("analysis"),
            build: root.join("build"),
            bundle,
            root,
        }
    }

    /// Registers the root with `cleanup`, then creates the tree.
    ///
    /// The runtime directory is left absent because jlink insists on
    /// creating it.
    pub async fn create(&self, cleanup: &mut CleanupManager) -> Result<()> {
        cleanup.track(&self.root);
        for dir in [&self.bundle, &self.analysis, &self.build] {
            tokio::fs::create_dir_all(dir)
                .await
                .fs_context("creating staging directory", dir)?;
        }
        if self.runner_copy.is_some() {
            let runner_dir = self.bundle.join(RUNNER_DIR);
            tokio::fs::create_dir_all(&runner_dir)
                .await
                .fs_context("creating staging directory", &runner_dir)?;
        }
        log::debug!("Staging tree at {}", self.root.display());
        Ok(())
    }

    /// Root of the staging tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory packaged into the artifact.
    pub fn bundle_dir(&self) -> &Path {
        &self.bundle
    }

    /// Runtime image directory.
    pub fn runtime_dir(&self) -> &Path {
        &self.runtime
    }

    /// Where the archive is copied.
    pub fn archive_copy(&self) -> &Path {
        &self.archive_copy
    }

    /// Where the WAR runner is copied, if any.
    pub fn runner_copy(&self) -> Option<&Path> {
        self.runner_copy.as_deref()
    }

    /// Generated launcher.
    pub fn launcher_stub(&self) -> &Path {
        &self.launcher_stub
    }

    /// Scratch directory for dependency analysis.
    pub fn analysis_dir(&self) -> &Path {
        &self.analysis
    }

    /// Scratch directory for the packaging collaborator.
    pub fn build_dir(&self) -> &Path {
        &self.build
    }
}
