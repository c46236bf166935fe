//! Probe strategies for finding installed JDKs.
//!
//! Each probe looks in one kind of place and returns the first eligible JDK
//! it finds there. Probes never iterate a directory listing without sorting
//! it, so identical environments always yield the same candidate.

use super::jdk::{self, JdkCandidate};
use crate::bundler::utils::{
    fs::{sorted_dir_entries_desc, version_sort_key},
    process::{self, QUERY_TIMEOUT, ToolInvocation},
};
use std::path::{Path, PathBuf};

/// One source of candidate JDK installations.
pub trait JdkProbe: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// The first eligible JDK this probe can see.
    fn probe(&self) -> Option<JdkCandidate>;
}

/// Returns the first eligible JDK among `homes`, in order.
pub fn first_eligible<I>(probe: &str, homes: I) -> Option<JdkCandidate>
where
    I: IntoIterator<Item = PathBuf>,
{
    for home in homes {
        match jdk::inspect(&home) {
            Ok(candidate) => match candidate.ineligibility() {
                None => return Some(candidate),
                Some(reason) => log::debug!("[{probe}] skipping: {reason}"),
            },
            Err(reason) => log::debug!("[{probe}] skipping: {reason}"),
        }
    }
    None
}

/// JDK named by an environment variable such as `JAVA_HOME`.
#[derive(Debug, Clone)]
pub struct EnvVarProbe {
    var: String,
}

impl EnvVarProbe {
    /// Probes the directory named by `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl JdkProbe for EnvVarProbe {
    fn name(&self) -> &str {
        &self.var
    }

    fn probe(&self) -> Option<JdkCandidate> {
        let value = std::env::var_os(&self.var).filter(|v| !v.is_empty())?;
        first_eligible(&self.var, [PathBuf::from(value)])
    }
}

/// JDK owning the `java` found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct PathProbe;

impl JdkProbe for PathProbe {
    fn name(&self) -> &str {
        "PATH"
    }

    fn probe(&self) -> Option<JdkCandidate> {
        let java = which::which("java").ok()?;
        // Follow /usr/bin/java -> /etc/alternatives/java -> <jdk>/bin/java.
        let java = java.canonicalize().unwrap_or(java);
        let home = java.parent()?.parent()?.to_path_buf();
        first_eligible(self.name(), [home])
    }
}

/// JDKs registered with toolchain version managers.
///
/// Queries `mise` and `asdf` when installed, then SDKMAN! and IntelliJ
/// download directories under the user's home.
#[derive(Debug, Clone)]
pub struct VersionManagerProbe {
    home: Option<PathBuf>,
}

impl Default for VersionManagerProbe {
    fn default() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }
}

impl VersionManagerProbe {
    /// Looks for manager directories under `home` instead of the user's home.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    fn query_managers(&self) -> Vec<PathBuf> {
        ["mise", "asdf"]
            .iter()
            .filter_map(|manager| {
                let program = which::which(manager).ok()?;
                let invocation = ToolInvocation::new(program).args(["where", "java"]);
                let output = match process::run_blocking(&invocation, QUERY_TIMEOUT) {
                    Ok(output) => output,
                    Err(failure) => {
                        log::debug!("{}", failure.describe());
                        return None;
                    }
                };
                if !output.success() {
                    return None;
                }
                let path = output.stdout.trim().to_string();
                (!path.is_empty()).then(|| PathBuf::from(path))
            })
            .collect()
    }

    fn directory_candidates(&self) -> Vec<PathBuf> {
        let Some(home) = &self.home else {
            return Vec::new();
        };
        let sdkman = home.join(".sdkman").join("candidates").join("java");
        let mut homes = vec![sdkman.join("current")];
        homes.extend(
            sorted_dir_entries_desc(&sdkman)
                .into_iter()
                .filter(|p| !p.ends_with("current")),
        );
        homes.extend(sorted_dir_entries_desc(&home.join(".jdks")));
        homes
    }
}

impl JdkProbe for VersionManagerProbe {
    fn name(&self) -> &str {
        "version managers"
    }

    fn probe(&self) -> Option<JdkCandidate> {
        let mut homes = self.query_managers();
        homes.extend(self.directory_candidates());
        first_eligible(self.name(), homes)
    }
}

/// JDKs in conventional install directories, matched by glob patterns.
#[derive(Debug, Clone)]
pub struct InstallDirProbe {
    patterns: Vec<String>,
}

impl InstallDirProbe {
    /// Probes directories matching `patterns`, pattern by pattern.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Standard install locations for the host platform.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new([
                "C:/Program Files/Java/*",
                "C:/Program Files/Eclipse Adoptium/*",
                "C:/Program Files/Microsoft/jdk-*",
                "C:/Program Files/Zulu/*",
            ])
        } else {
            Self::new(["/usr/lib/jvm/*", "/usr/java/*", "/opt/java/*", "/opt/jdk*"])
        }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let mut homes = Vec::new();
        for pattern in &self.patterns {
            let Ok(paths) = glob::glob(pattern) else {
                log::debug!("Ignoring invalid probe pattern {pattern}");
                continue;
            };
            let mut matched: Vec<PathBuf> = paths.flatten().filter(|p| p.is_dir()).collect();
            matched.sort_by_cached_key(|p| std::cmp::Reverse(version_sort_key(p)));
            homes.extend(matched);
        }
        homes
    }
}

impl JdkProbe for InstallDirProbe {
    fn name(&self) -> &str {
        "install directories"
    }

    fn probe(&self) -> Option<JdkCandidate> {
        first_eligible(self.name(), self.candidates())
    }
}

/// Escapes glob metacharacters so `path` matches only itself.
pub fn literal_pattern(path: &Path) -> String {
    glob::Pattern::escape(&path.to_string_lossy())
}
