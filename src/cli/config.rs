//! Optional TOML configuration file.
//!
//! ```toml
//! jdk = "/usr/lib/jvm/temurin-21"
//! modules = ["java.sql"]
//! name = "app"
//! platform = "linux"
//! packager = "shell"
//! jvm_args = ["-Xmx512m"]
//!
//! [timeouts]
//! analysis_secs = 60
//! ```
//!
//! Relative paths are resolved against the file's directory. Command line
//! flags override every value given here.

use super::args::{AnalysisArgs, PackageArgs};
use crate::{
    bundler::{ConsoleMode, PackagerKind, RequestBuilder, TargetPlatform, Timeouts},
    error::{CliError, Result},
};
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// File looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "jarpack.toml";

/// Contents of a configuration file.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// JDK installation
    pub jdk: Option<PathBuf>,
    /// Extra modules
    #[serde(default)]
    pub modules: Vec<String>,
    /// Include every JDK module
    pub all_modules: Option<bool>,
    /// Artifact name
    pub name: Option<String>,
    /// Target platform
    pub platform: Option<TargetPlatform>,
    /// Output directory
    pub output_dir: Option<PathBuf>,
    /// Staging base directory
    pub work_dir: Option<PathBuf>,
    /// Packager selection
    pub packager: Option<PackagerKind>,
    /// Executable icon
    pub icon: Option<PathBuf>,
    /// GUI executable without console
    pub windowed: Option<bool>,
    /// Main class for JARs without `Main-Class`
    pub main_class: Option<String>,
    /// WAR runner JAR
    pub war_runner: Option<PathBuf>,
    /// JVM arguments
    #[serde(default)]
    pub jvm_args: Vec<String>,
    /// `jlink --strip-debug`
    pub strip_debug: Option<bool>,
    /// External tool time limits
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// `[timeouts]` table, in seconds.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// jdeps and `java --list-modules`
    pub analysis_secs: Option<u64>,
    /// jlink
    pub image_secs: Option<u64>,
    /// Packaging collaborator
    pub package_secs: Option<u64>,
}

impl FileConfig {
    /// Loads the explicit file, or `./jarpack.toml` when present, or nothing.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parses `path` and resolves its relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::parse(&content).map_err(|e| CliError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        let base = path.parent().unwrap_or(Path::new(""));
        Ok(config.rebased(base))
    }

    /// Parses configuration text.
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn rebased(mut self, base: &Path) -> Self {
        for path in [
            &mut self.jdk,
            &mut self.output_dir,
            &mut self.work_dir,
            &mut self.icon,
            &mut self.war_runner,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    /// Time limits, defaults filled in.
    pub fn timeouts(&self) -> Timeouts {
        let defaults = Timeouts::default();
        let secs = |value: Option<u64>, default: Duration| {
            value.map(Duration::from_secs).unwrap_or(default)
        };
        Timeouts {
            analysis: secs(self.timeouts.analysis_secs, defaults.analysis),
            image: secs(self.timeouts.image_secs, defaults.image),
            package: secs(self.timeouts.package_secs, defaults.package),
        }
    }

    /// Request builder for `archive` with analysis options, flags first.
    pub fn analysis_builder(&self, archive: &Path, args: &AnalysisArgs) -> RequestBuilder {
        let mut builder = RequestBuilder::new()
            .archive(archive)
            .all_modules(args.all_modules || self.all_modules.unwrap_or(false))
            .timeouts(self.timeouts());

        let modules = if args.modules.is_empty() {
            &self.modules
        } else {
            &args.modules
        };
        builder = builder.extra_modules(modules.iter().cloned());

        if let Some(jdk) = args.jdk.as_ref().or(self.jdk.as_ref()) {
            builder = builder.jdk_override(jdk);
        }
        if let Some(class) = args.main_class.as_ref().or(self.main_class.as_ref()) {
            builder = builder.main_class(class.clone());
        }
        if let Some(dir) = args.work_dir.as_ref().or(self.work_dir.as_ref()) {
            builder = builder.work_dir(dir);
        }
        builder
    }

    /// Request builder for a `package` run, flags first.
    pub fn package_builder(&self, args: &PackageArgs) -> RequestBuilder {
        let mut builder = self
            .analysis_builder(&args.archive, &args.analysis)
            .strip_debug(args.strip_debug || self.strip_debug.unwrap_or(false))
            .console(if args.windowed || self.windowed.unwrap_or(false) {
                ConsoleMode::Windowed
            } else {
                ConsoleMode::Console
            })
            .packager(args.packager.or(self.packager).unwrap_or_default());

        let jvm_args = if args.jvm_args.is_empty() {
            &self.jvm_args
        } else {
            &args.jvm_args
        };
        builder = builder.jvm_args(jvm_args.iter().cloned());

        if let Some(name) = args.name.as_ref().or(self.name.as_ref()) {
            builder = builder.output_name(name.clone());
        }
        if let Some(platform) = args.platform.or(self.platform) {
            builder = builder.target_platform(platform);
        }
        if let Some(dir) = args.output_dir.as_ref().or(self.output_dir.as_ref()) {
            builder = builder.output_dir(dir);
        }
        if let Some(icon) = args.icon.as_ref().or(self.icon.as_ref()) {
            builder = builder.icon(icon);
        }
        if let Some(runner) = args.war_runner.as_ref().or(self.war_runner.as_ref()) {
            builder = builder.war_runner(runner);
        }
        builder
    }
}
