//! Top-level error types for the command line tool.
//!
//! Maps every failure to a process exit code so calling scripts can branch
//! on the failure category, and attaches recovery suggestions for the user.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failures without a more specific category.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for unusable arguments, archives or configuration (`EX_USAGE`).
pub const EXIT_USAGE: i32 = 64;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("{0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Pipeline errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Configuration file could not be used
    #[error("Invalid configuration file {}: {reason}", .path.display())]
    InvalidConfig {
        /// Configuration file
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },
}

impl BundlerError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlerError::Cli(_) | BundlerError::Toml(_) => EXIT_USAGE,
            BundlerError::Bundler(e) => e.exit_code(),
            BundlerError::Io(_) | BundlerError::Json(_) => EXIT_FAILURE,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error;

        match self {
            BundlerError::Bundler(Error::ToolchainNotFound { .. }) => vec![
                "Install a JDK 9 or newer (a JRE is not enough: jdeps and jlink are required)"
                    .to_string(),
                "Point JAVA_HOME at it, or pass --jdk <path>".to_string(),
            ],
            BundlerError::Bundler(Error::DependencyAnalysisFailed { .. }) => vec![
                "Check the jdeps output above".to_string(),
                "Pass --modules explicitly or use --all-modules to skip analysis".to_string(),
            ],
            BundlerError::Bundler(Error::EmptyDependencySet { .. }) => {
                vec!["Pass the required modules with --modules".to_string()]
            }
            BundlerError::Bundler(Error::ImageBuildFailed { .. }) => vec![
                "Check the jlink output above for unresolved modules".to_string(),
                "Make sure every name passed with --modules exists in the selected JDK"
                    .to_string(),
            ],
            BundlerError::Bundler(Error::PackagingFailed { .. }) => vec![
                "Install PyInstaller (pip install pyinstaller) or use --packager shell for Linux targets"
                    .to_string(),
            ],
            BundlerError::Bundler(Error::InvalidArchive { .. }) => {
                vec!["Pass a readable .jar or .war file".to_string()]
            }
            BundlerError::Cli(CliError::InvalidConfig { .. }) | BundlerError::Toml(_) => {
                vec!["Fix or remove the configuration file (see --help for the keys)".to_string()]
            }
            _ => Vec::new(),
        }
    }
}
