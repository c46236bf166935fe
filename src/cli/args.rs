//! Command line argument parsing.
//!
//! This module provides the CLI surface using clap derive. Values given here
//! override the configuration file.

use crate::bundler::{PackagerKind, TargetPlatform};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Package a JAR or WAR into a single native executable
#[derive(Parser, Debug)]
#[command(
    name = "jarpack",
    version,
    about = "Package a JAR or WAR into a single native executable",
    long_about = "Packages a Java archive together with a trimmed Java runtime into one executable \
that runs without an installed Java.

The runtime contains only the modules the archive needs (found with jdeps, built with jlink).

Usage:
  jarpack package app.jar
  jarpack package app.war --modules java.sql --war-runner jetty-runner.jar
  jarpack package app.jar --platform windows --name app --windowed --icon app.ico
  jarpack modules app.jar
  jarpack jdk

Settings may also come from ./jarpack.toml or --config <file>; flags win.

Exit codes: 0 success, 2 no usable JDK, 3 dependency analysis failed, 4 no modules \
resolved, 5 runtime image build failed, 6 packaging failed, 64 invalid input, 130 interrupted."
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ./jarpack.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a native executable from an archive
    Package(PackageArgs),
    /// Show which JDK would be used
    Jdk(JdkArgs),
    /// Show which modules the archive needs
    Modules(ModulesArgs),
}

/// Options shared by commands that analyse an archive.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// JDK installation to use; disables auto-detection
    #[arg(long, value_name = "PATH")]
    pub jdk: Option<PathBuf>,

    /// Extra modules to include (comma-separated or repeated)
    #[arg(short, long, value_name = "MODULES", value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Include every module of the JDK instead of analysing
    #[arg(long)]
    pub all_modules: bool,

    /// Main class, for JARs whose manifest has none
    #[arg(long, value_name = "CLASS")]
    pub main_class: Option<String>,

    /// Directory for per-run staging trees (default: system temp dir)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,
}

/// `package` options
#[derive(clap::Args, Debug, Clone)]
pub struct PackageArgs {
    /// Archive to package (.jar or .war)
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Artifact name (default: archive file stem)
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Target platform: linux, windows (default: host)
    #[arg(short, long, value_name = "PLATFORM")]
    pub platform: Option<TargetPlatform>,

    /// Output directory (default: dist)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Packager: auto, pyinstaller, shell
    #[arg(long, value_name = "PACKAGER")]
    pub packager: Option<PackagerKind>,

    /// Icon for the executable
    #[arg(long, value_name = "FILE")]
    pub icon: Option<PathBuf>,

    /// Build a GUI executable without a console window
    #[arg(long)]
    pub windowed: bool,

    /// Servlet container runner JAR to launch a WAR with
    #[arg(long, value_name = "JAR")]
    pub war_runner: Option<PathBuf>,

    /// Argument passed to the JVM (repeatable)
    #[arg(long = "jvm-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub jvm_args: Vec<String>,

    /// Strip debug information from the runtime image
    #[arg(long)]
    pub strip_debug: bool,

    /// Write a JSON report of the artifact to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

/// `jdk` options
#[derive(clap::Args, Debug, Clone, Default)]
pub struct JdkArgs {
    /// JDK installation to validate instead of searching
    #[arg(long, value_name = "PATH")]
    pub jdk: Option<PathBuf>,
}

/// `modules` options
#[derive(clap::Args, Debug, Clone)]
pub struct ModulesArgs {
    /// Archive to analyse (.jar or .war)
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter for `env_logger` when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "jarpack=debug"
        } else if self.quiet {
            "jarpack=warn"
        } else {
            "jarpack=info"
        }
    }
}
