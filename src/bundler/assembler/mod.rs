//! Bundle assembly.
//!
//! Populates the staging bundle with the archive, an optional WAR runner and
//! the generated launcher, runs the packaging collaborator once, and commits
//! its output to the destination. The destination only ever receives a
//! finished file: the output is written to a hidden sibling first and then
//! renamed into place.

pub mod launcher;
pub mod packager;
mod staging;
pub(crate) mod templates;

pub use launcher::{LaunchArg, LaunchSpec, LauncherFlavor};
pub use packager::{PackageInput, Packager};
pub use staging::{STAGING_PREFIX, StagingLayout};

use crate::bundler::{
    Error, ErrorExt, PackagingRequest, Result,
    cleanup::CleanupManager,
    utils::fs::{copy_file, set_executable, write_executable},
};
use std::path::{Path, PathBuf};

/// Assembles the bundle in `layout` and commits the artifact.
///
/// The runtime image must already be in `layout.runtime_dir()`. Returns the
/// final artifact path.
pub async fn assemble(
    request: &PackagingRequest,
    layout: &StagingLayout,
    packager: &dyn Packager,
    cleanup: &mut CleanupManager,
) -> Result<PathBuf> {
    copy_file(request.archive_path(), layout.archive_copy()).await?;
    if let (Some(runner), Some(copy)) = (request.war_runner(), layout.runner_copy()) {
        copy_file(runner, copy).await?;
    }

    let launch = LaunchSpec::for_request(request);
    log::info!("Launcher runs: {}", launch.describe());
    let source = launch.render(packager.launcher_flavor())?;
    write_executable(layout.launcher_stub(), source.as_bytes()).await?;

    log::info!("Packaging with {}", packager.name());
    let built = packager
        .package(PackageInput {
            request,
            layout,
            launch: &launch,
        })
        .await?;

    let destination = request.output_path();
    commit(&built, &destination, cleanup).await?;
    Ok(destination)
}

/// Moves `built` to `destination` without ever exposing a partial file there.
///
/// The copy goes to a tracked `.<name>.<uuid>.partial` sibling that is
/// renamed into place once complete.
pub async fn commit(built: &Path, destination: &Path, cleanup: &mut CleanupManager) -> Result<()> {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::PackagingFailed {
            reason: format!("invalid output path {}", destination.display()),
            output: String::new(),
        })?;
    let dir = destination.parent().unwrap_or(Path::new("."));
    tokio::fs::create_dir_all(dir)
        .await
        .fs_context("creating output directory", dir)?;

    let partial = dir.join(format!(
        ".{file_name}.{}.partial",
        uuid::Uuid::new_v4().simple()
    ));
    cleanup.track(&partial);

    tokio::fs::copy(built, &partial)
        .await
        .map_err(|e| Error::PackagingFailed {
            reason: format!("copying artifact to {}: {e}", partial.display()),
            output: String::new(),
        })?;
    set_executable(&partial).await?;
    tokio::fs::rename(&partial, destination)
        .await
        .map_err(|e| Error::PackagingFailed {
            reason: format!("moving artifact to {}: {e}", destination.display()),
            output: String::new(),
        })?;

    log::info!("Artifact written to {}", destination.display());
    Ok(())
}
