//! Error types for the packaging pipeline.
//!
//! Every stage reports failures through [`Error`]. Failures of external tools
//! keep the tool's captured output verbatim, because the actionable diagnostic
//! (for example `module not found: java.xml`) lives there.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No eligible JDK was found, or the explicit override is not usable.
    #[error("no usable JDK found: {reason}")]
    ToolchainNotFound {
        /// Why the search or the override failed
        reason: String,
    },

    /// The dependency analysis tool failed or could not be run.
    #[error("dependency analysis failed ({}){}", describe_exit(.exit_code), describe_output(.output))]
    DependencyAnalysisFailed {
        /// Exit code of jdeps, `None` when it never exited normally
        exit_code: Option<i32>,
        /// Captured stdout and stderr
        output: String,
    },

    /// Analysis succeeded but resolved no modules for a modular archive.
    #[error("dependency analysis of {} resolved no modules", .archive.display())]
    EmptyDependencySet {
        /// Archive that was analysed
        archive: PathBuf,
    },

    /// The runtime image builder failed or produced an unusable image.
    #[error("runtime image build failed ({}){}", describe_exit(.exit_code), describe_output(.output))]
    ImageBuildFailed {
        /// Exit code of jlink, `None` for validation failures and timeouts
        exit_code: Option<i32>,
        /// Captured output or validation message
        output: String,
    },

    /// Final single-file packaging failed.
    #[error("packaging failed: {reason}{}", describe_output(.output))]
    PackagingFailed {
        /// Short description of the failure
        reason: String,
        /// Captured collaborator output, may be empty
        output: String,
    },

    /// The input archive is missing or unusable.
    #[error("invalid archive {}: {reason}", .path.display())]
    InvalidArchive {
        /// Archive path as given
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// The run was interrupted before it completed.
    #[error("interrupted")]
    Interrupted,

    /// Filesystem operation failed on a specific path.
    #[error("{context} {}: {error}", .path.display())]
    Fs {
        /// Operation being performed
        context: &'static str,
        /// Path the operation was performed on
        path: PathBuf,
        /// Underlying error
        #[source]
        error: io::Error,
    },

    /// Generic error.
    #[error("{0}")]
    GenericError(String),

    /// IO error.
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// Archive read error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Launcher template failed to render.
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Launcher template failed to parse.
    #[error("template error: {0}")]
    TemplateSyntax(#[from] handlebars::TemplateError),

    /// Directory traversal error.
    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    /// Process exit code for this failure category.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolchainNotFound { .. } => 2,
            Error::DependencyAnalysisFailed { .. } => 3,
            Error::EmptyDependencySet { .. } => 4,
            Error::ImageBuildFailed { .. } => 5,
            Error::PackagingFailed { .. } => 6,
            Error::InvalidArchive { .. } => 64,
            Error::Interrupted => 130,
            _ => 1,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

fn describe_output(output: &str) -> String {
    let trimmed = output.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

/// Attaches filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Wraps the error with an operation description and the affected path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Converts options and foreign errors into [`Error::GenericError`].
pub trait Context<T> {
    /// Adds a message describing what was being attempted.
    fn context<C: Display>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

impl<T> Context<T> for Result<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }
}

/// Returns early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
