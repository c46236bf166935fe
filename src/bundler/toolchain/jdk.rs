//! JDK installation inspection.

use crate::bundler::utils::process::{self, QUERY_TIMEOUT, ToolInvocation};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Minimum feature release providing jdeps and jlink.
pub const MIN_JDK_VERSION: u32 = 9;

static RELEASE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^JAVA_VERSION="?([^"\s]+)"?"#).expect("valid regex")
});

static VERSION_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"version "([^"]+)""#).expect("valid regex"));

/// A JDK installation and what it provides.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct JdkCandidate {
    /// Installation root (the directory containing `bin/`)
    pub installation_path: PathBuf,
    /// Feature release number (`1.8` reports as 8)
    pub version: u32,
    /// `bin/jdeps` is present
    pub has_dependency_tool: bool,
    /// `bin/jlink` is present
    pub has_image_builder_tool: bool,
}

impl JdkCandidate {
    /// Why this candidate cannot be used, or `None` when it is eligible.
    pub fn ineligibility(&self) -> Option<String> {
        if self.version < MIN_JDK_VERSION {
            Some(format!(
                "JDK at {} is version {}, version {} or newer is required",
                self.installation_path.display(),
                self.version,
                MIN_JDK_VERSION
            ))
        } else if !self.has_dependency_tool {
            Some(format!(
                "{} is missing jdeps (is this a JRE rather than a JDK?)",
                self.installation_path.display()
            ))
        } else if !self.has_image_builder_tool {
            Some(format!(
                "{} is missing jlink (is this a JRE rather than a JDK?)",
                self.installation_path.display()
            ))
        } else {
            None
        }
    }

    /// Whether the version and companion tool requirements hold.
    pub fn is_eligible(&self) -> bool {
        self.ineligibility().is_none()
    }

    /// Path of a tool in the JDK's `bin` directory.
    pub fn tool(&self, name: &str) -> PathBuf {
        tool_path(&self.installation_path, name)
    }

    /// The JDK's `jmods` directory when it ships one.
    pub fn jmods(&self) -> Option<PathBuf> {
        let jmods = self.installation_path.join("jmods");
        jmods.is_dir().then_some(jmods)
    }
}

/// Path of `bin/<name>` (with `.exe` on Windows) under `home`.
pub fn tool_path(home: &Path, name: &str) -> PathBuf {
    let file = if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    };
    home.join("bin").join(file)
}

/// Inspects a directory as a JDK installation.
///
/// Returns `Err` with a reason when the directory is not a JDK at all
/// (missing, or no `java` launcher / version information). An `Ok` result
/// may still be ineligible; check [`JdkCandidate::ineligibility`].
pub fn inspect(home: &Path) -> Result<JdkCandidate, String> {
    if !home.is_dir() {
        return Err(format!("{} does not exist or is not a directory", home.display()));
    }
    let version = detect_version(home)
        .ok_or_else(|| format!("cannot determine the Java version of {}", home.display()))?;
    Ok(JdkCandidate {
        installation_path: home.to_path_buf(),
        version,
        has_dependency_tool: tool_path(home, "jdeps").is_file(),
        has_image_builder_tool: tool_path(home, "jlink").is_file(),
    })
}

/// Reads the feature version from `release`, falling back to `java -version`.
fn detect_version(home: &Path) -> Option<u32> {
    let from_release = std::fs::read_to_string(home.join("release"))
        .ok()
        .and_then(|release| parse_release_version(&release));
    if from_release.is_some() {
        return from_release;
    }

    let java = tool_path(home, "java");
    if !java.is_file() {
        return None;
    }
    // `java -version` prints to stderr.
    let output = match process::run_blocking(&ToolInvocation::new(&java).arg("-version"), QUERY_TIMEOUT) {
        Ok(output) => output,
        Err(failure) => {
            log::debug!("{}", failure.describe());
            return None;
        }
    };
    parse_version_banner(&format!("{}{}", output.stderr, output.stdout))
}

/// Extracts the feature version from a `release` file.
pub fn parse_release_version(release: &str) -> Option<u32> {
    let caps = RELEASE_VERSION.captures(release)?;
    feature_version(caps.get(1)?.as_str())
}

/// Extracts the feature version from `java -version` output.
pub fn parse_version_banner(banner: &str) -> Option<u32> {
    let caps = VERSION_BANNER.captures(banner)?;
    feature_version(caps.get(1)?.as_str())
}

/// `"1.8.0_292"` -> 8, `"17.0.2"` -> 17, `"21-ea"` -> 21.
pub fn feature_version(raw: &str) -> Option<u32> {
    let mut parts = raw.split(|c: char| !c.is_ascii_digit());
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}
