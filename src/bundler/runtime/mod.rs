//! Runtime image construction with jlink.
//!
//! Builds a trimmed Java runtime containing exactly the resolved modules into
//! a directory that must not exist yet, then checks that the image actually
//! has a runnable `java` launcher before handing it on.

use crate::bundler::{
    Error, ErrorExt, Result,
    modules::ModuleSet,
    toolchain::{JdkCandidate, jdk::tool_path},
    utils::{
        fs::is_executable_file,
        process::{self, ToolInvocation},
    },
};
use std::{path::Path, time::Duration};

/// Options passed through to jlink.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOptions {
    /// Add `--strip-debug`
    pub strip_debug: bool,
}

/// Builds the jlink command line.
pub fn jlink_invocation(
    jdk: &JdkCandidate,
    modules: &ModuleSet,
    output_dir: &Path,
    options: ImageOptions,
) -> ToolInvocation {
    let mut invocation = ToolInvocation::new(jdk.tool("jlink"));
    if let Some(jmods) = jdk.jmods() {
        invocation = invocation.arg("--module-path").arg(jmods);
    }
    invocation = invocation
        .arg("--add-modules")
        .arg(modules.to_arg())
        .arg("--output")
        .arg(output_dir)
        .args(["--no-header-files", "--no-man-pages"]);
    if options.strip_debug {
        invocation = invocation.arg("--strip-debug");
    }
    invocation
}

/// Builds a runtime image with `modules` into `output_dir`.
///
/// `output_dir` must not exist; jlink refuses to write into an existing
/// directory and a leftover from an earlier run would be ambiguous anyway.
/// Its parent is created if needed.
///
/// # Errors
///
/// `ImageBuildFailed` with jlink's output when it exits non-zero or times out
/// twice, or with a validation message when the image has no usable launcher.
pub async fn build_runtime(
    jdk: &JdkCandidate,
    modules: &ModuleSet,
    output_dir: &Path,
    options: ImageOptions,
    timeout: Duration,
) -> Result<()> {
    if output_dir.exists() {
        return Err(Error::ImageBuildFailed {
            exit_code: None,
            output: format!("output directory {} already exists", output_dir.display()),
        });
    }
    if let Some(parent) = output_dir.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating directory", parent)?;
    }

    log::info!("Building runtime image with {} module(s)", modules.len());
    let invocation = jlink_invocation(jdk, modules, output_dir, options);
    log::debug!("Running {invocation}");

    let output = process::run_with_retry(&invocation, timeout)
        .await
        .map_err(|failure| Error::ImageBuildFailed {
            exit_code: None,
            output: failure.describe(),
        })?;
    if !output.success() {
        return Err(Error::ImageBuildFailed {
            exit_code: output.exit_code,
            output: output.combined(),
        });
    }

    validate_image(output_dir)?;
    let (files, bytes) = image_size(output_dir)?;
    log::info!(
        "Runtime image ready: {} files, {:.1} MiB",
        files,
        bytes as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

/// Number of files and total bytes under `image`.
pub fn image_size(image: &Path) -> Result<(u64, u64)> {
    let mut files = 0;
    let mut bytes = 0;
    for entry in walkdir::WalkDir::new(image).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files += 1;
            bytes += entry.metadata()?.len();
        }
    }
    Ok((files, bytes))
}

/// Checks that `image` has a non-empty, executable `bin/java`.
pub fn validate_image(image: &Path) -> Result<()> {
    let java = tool_path(image, "java");
    if is_executable_file(&java) {
        Ok(())
    } else {
        Err(Error::ImageBuildFailed {
            exit_code: None,
            output: format!(
                "runtime image has no usable launcher at {}",
                java.display()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn jdk(home: &Path) -> JdkCandidate {
        JdkCandidate {
            installation_path: home.to_path_buf(),
            version: 17,
            has_dependency_tool: true,
            has_image_builder_tool: true,
        }
    }

    fn modules() -> ModuleSet {
        ModuleSet::merge(["java.sql", "java.base"], &BTreeSet::new()).unwrap()
    }

    fn args(invocation: &ToolInvocation) -> Vec<String> {
        invocation
            .arguments()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn command_line_lists_sorted_modules() {
        let dir = tempfile::tempdir().unwrap();
        let inv = jlink_invocation(
            &jdk(dir.path()),
            &modules(),
            Path::new("/stage/runtime"),
            ImageOptions::default(),
        );
        assert_eq!(
            args(&inv),
            [
                "--add-modules",
                "java.base,java.sql",
                "--output",
                "/stage/runtime",
                "--no-header-files",
                "--no-man-pages"
            ]
        );
    }

    #[test]
    fn jmods_and_strip_debug_are_added_when_applicable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("jmods")).unwrap();
        let inv = jlink_invocation(
            &jdk(dir.path()),
            &modules(),
            Path::new("/out"),
            ImageOptions { strip_debug: true },
        );
        let args = args(&inv);
        assert_eq!(args[0], "--module-path");
        assert_eq!(PathBuf::from(&args[1]), dir.path().join("jmods"));
        assert_eq!(args.last().map(String::as_str), Some("--strip-debug"));
    }

    #[tokio::test]
    async fn existing_output_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_runtime(
            &jdk(dir.path()),
            &modules(),
            dir.path(),
            ImageOptions::default(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ImageBuildFailed { exit_code: None, .. }));
    }

    #[test]
    fn image_size_counts_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib/security")).unwrap();
        std::fs::write(dir.path().join("release"), "abc").unwrap();
        std::fs::write(dir.path().join("lib/security/policy"), "12345").unwrap();
        assert_eq!(image_size(dir.path()).unwrap(), (2, 8));
    }

    #[test]
    fn empty_launcher_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        std::fs::write(tool_path(dir.path(), "java"), "").unwrap();
        assert!(validate_image(dir.path()).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_jlink_output_is_kept_verbatim() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let jlink = bin.join("jlink");
        std::fs::write(
            &jlink,
            "#!/bin/sh\necho 'Error: Module java.xmlx not found' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&jlink, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = build_runtime(
            &jdk(dir.path()),
            &modules(),
            &dir.path().join("stage").join("runtime"),
            ImageOptions::default(),
            Duration::from_secs(10),
        )
        .await
        .unwrap_err();
        match err {
            Error::ImageBuildFailed { exit_code, output } => {
                assert_eq!(exit_code, Some(1));
                assert!(output.contains("Module java.xmlx not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
