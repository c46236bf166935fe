//! Packaging collaborators.
//!
//! A [`Packager`] turns a complete bundle directory into one executable file
//! inside the staging tree. Committing that file to the output location is
//! the assembler's job, so a packager never writes outside `build/`.

mod pyinstaller;
mod shell;

pub use pyinstaller::PyInstallerPackager;
pub use shell::ShellPackager;

use super::{LaunchSpec, StagingLayout, launcher::LauncherFlavor};
use crate::bundler::{Error, PackagerKind, PackagingRequest, Result, TargetPlatform};
use std::{future::Future, path::PathBuf, pin::Pin};

/// Boxed future returned by object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a packager gets to see.
#[derive(Debug, Clone, Copy)]
pub struct PackageInput<'a> {
    /// The run's request (name, platform, icon, console mode)
    pub request: &'a PackagingRequest,
    /// Populated staging tree
    pub layout: &'a StagingLayout,
    /// Command line the launcher runs
    pub launch: &'a LaunchSpec,
}

/// Turns a bundle directory into a single executable.
pub trait Packager: Send + Sync {
    /// Name for logs and reports.
    fn name(&self) -> &str;

    /// Launcher language this packager expects in the bundle.
    fn launcher_flavor(&self) -> LauncherFlavor;

    /// Builds the executable and returns its path inside `layout.build_dir()`.
    fn package<'a>(&'a self, input: PackageInput<'a>) -> BoxFuture<'a, Result<PathBuf>>;
}

/// Chooses the packager for `kind` and `platform`.
///
/// `Auto` prefers PyInstaller when it is installed and can build for the
/// target (no cross-builds), then the built-in shell packager for Linux.
pub fn select(kind: PackagerKind, platform: TargetPlatform) -> Result<Box<dyn Packager>> {
    match kind {
        PackagerKind::PyInstaller => {
            let packager = PyInstallerPackager::detect().ok_or_else(|| Error::PackagingFailed {
                reason: "PyInstaller is not installed (tried `pyinstaller` and `python3 -m PyInstaller`)"
                    .into(),
                output: String::new(),
            })?;
            packager.check_target(platform)?;
            Ok(Box::new(packager))
        }
        PackagerKind::Shell => {
            ShellPackager::check_target(platform)?;
            Ok(Box::new(ShellPackager))
        }
        PackagerKind::Auto => {
            if let Some(packager) =
                PyInstallerPackager::detect().filter(|p| p.check_target(platform).is_ok())
            {
                return Ok(Box::new(packager));
            }
            if ShellPackager::check_target(platform).is_ok() {
                return Ok(Box::new(ShellPackager));
            }
            Err(Error::PackagingFailed {
                reason: format!(
                    "no packager can build a {platform} artifact on this host; \
                     install PyInstaller on a {platform} machine"
                ),
                output: String::new(),
            })
        }
    }
}
