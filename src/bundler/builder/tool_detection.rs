//! External tool detection and availability checking.
//!
//! Detects optional packaging collaborators once per process.

use crate::bundler::utils::process::{self, QUERY_TIMEOUT, ToolInvocation};
use std::{ffi::OsString, path::PathBuf, sync::LazyLock};

/// How to start PyInstaller: a program plus leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyInstallerCommand {
    /// `pyinstaller` or a Python interpreter
    pub program: PathBuf,
    /// Empty, or `-m PyInstaller`
    pub prefix: Vec<OsString>,
}

/// PyInstaller, if installed.
///
/// Tries the `pyinstaller` entry point first, then `python3 -m PyInstaller`
/// and `python -m PyInstaller`. Cached to avoid repeated subprocess calls.
pub static PYINSTALLER: LazyLock<Option<PyInstallerCommand>> = LazyLock::new(|| {
    let direct = which::which("pyinstaller").ok().map(|program| PyInstallerCommand {
        program,
        prefix: Vec::new(),
    });
    let modules = ["python3", "python"].into_iter().filter_map(|python| {
        which::which(python).ok().map(|program| PyInstallerCommand {
            program,
            prefix: vec!["-m".into(), "PyInstaller".into()],
        })
    });

    direct.into_iter().chain(modules).find(responds_to_version)
});

fn responds_to_version(command: &PyInstallerCommand) -> bool {
    let invocation = ToolInvocation::new(&command.program)
        .args(&command.prefix)
        .arg("--version");
    match process::run_blocking(&invocation, QUERY_TIMEOUT) {
        Ok(output) if output.success() => {
            log::debug!(
                "PyInstaller {} available via {}",
                output.stdout.trim(),
                command.program.display()
            );
            true
        }
        Ok(output) => {
            log::debug!(
                "{} cannot run PyInstaller (exit code: {:?}): {}",
                command.program.display(),
                output.exit_code,
                output.stderr.trim()
            );
            false
        }
        Err(failure) => {
            log::debug!("PyInstaller check skipped: {}", failure.describe());
            false
        }
    }
}
