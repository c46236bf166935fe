//! PyInstaller `--onefile` packager.
//!
//! Freezes the generated Python launcher together with the bundle contents
//! into one executable. PyInstaller only builds for the platform it runs on.

use super::{BoxFuture, PackageInput, Packager};
use crate::bundler::{
    ConsoleMode, Error, Result, TargetPlatform,
    assembler::launcher::{LauncherFlavor, RUNNER_DIR, RUNTIME_DIR},
    builder::tool_detection::{PYINSTALLER, PyInstallerCommand},
    utils::process::{self, ToolInvocation},
};
use std::{ffi::OsString, path::Path, path::PathBuf};

/// PyInstaller-backed packager.
#[derive(Debug, Clone)]
pub struct PyInstallerPackager {
    command: PyInstallerCommand,
}

impl PyInstallerPackager {
    /// The installed PyInstaller, if any.
    pub fn detect() -> Option<Self> {
        PYINSTALLER.clone().map(Self::with_command)
    }

    /// Uses `command` to start PyInstaller.
    pub fn with_command(command: PyInstallerCommand) -> Self {
        Self { command }
    }

    /// Fails unless `platform` is the host platform.
    pub fn check_target(&self, platform: TargetPlatform) -> Result<()> {
        if TargetPlatform::host() == Some(platform) {
            Ok(())
        } else {
            Err(Error::PackagingFailed {
                reason: format!("PyInstaller cannot cross-build {platform} artifacts on this host"),
                output: String::new(),
            })
        }
    }

    /// Builds the PyInstaller command line for `input`.
    pub fn invocation(&self, input: &PackageInput<'_>) -> ToolInvocation {
        let request = input.request;
        let layout = input.layout;
        let build = layout.build_dir();

        let mut invocation = ToolInvocation::new(&self.command.program)
            .args(&self.command.prefix)
            .args(["--onefile", "--noconfirm", "--clean", "--log-level", "WARN"])
            .arg("--name")
            .arg(request.output_name())
            .arg("--distpath")
            .arg(build.join("dist"))
            .arg("--workpath")
            .arg(build.join("work"))
            .arg("--specpath")
            .arg(build.join("spec"))
            .arg("--add-data")
            .arg(add_data(layout.runtime_dir(), RUNTIME_DIR))
            .arg("--add-data")
            .arg(add_data(layout.archive_copy(), "."));
        if let Some(runner) = layout.runner_copy() {
            invocation = invocation.arg("--add-data").arg(add_data(runner, RUNNER_DIR));
        }
        invocation = invocation.arg(match request.console() {
            ConsoleMode::Console => "--console",
            ConsoleMode::Windowed => "--windowed",
        });
        if let Some(icon) = request.icon() {
            invocation = invocation.arg("--icon").arg(icon);
        }
        invocation.arg(layout.launcher_stub()).current_dir(build)
    }
}

impl Packager for PyInstallerPackager {
    fn name(&self) -> &str {
        "pyinstaller"
    }

    fn launcher_flavor(&self) -> LauncherFlavor {
        LauncherFlavor::Python
    }

    fn package<'a>(&'a self, input: PackageInput<'a>) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            self.check_target(input.request.target_platform())?;
            let invocation = self.invocation(&input);
            log::debug!("Running {invocation}");

            let output = process::run_with_retry(&invocation, input.request.timeouts().package)
                .await
                .map_err(|failure| Error::PackagingFailed {
                    reason: failure.describe(),
                    output: String::new(),
                })?;
            if !output.success() {
                return Err(Error::PackagingFailed {
                    reason: format!(
                        "pyinstaller exited with {}",
                        output
                            .exit_code
                            .map_or_else(|| "no exit code".to_string(), |c| format!("code {c}"))
                    ),
                    output: output.combined(),
                });
            }

            let built = input
                .layout
                .build_dir()
                .join("dist")
                .join(input.request.target_platform().artifact_file_name(input.request.output_name()));
            if !built.is_file() {
                return Err(Error::PackagingFailed {
                    reason: format!("pyinstaller produced no file at {}", built.display()),
                    output: output.combined(),
                });
            }
            Ok(built)
        })
    }
}

/// `--add-data` value: `<source><pathsep><destination>`.
fn add_data(source: &Path, destination: &str) -> OsString {
    let separator = if cfg!(windows) { ";" } else { ":" };
    let mut value = source.as_os_str().to_os_string();
    value.push(separator);
    value.push(destination);
    value
}
