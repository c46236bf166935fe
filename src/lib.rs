//! Java archive to native executable packaging.
//!
//! Turns a JAR or WAR into one self-contained executable: finds a JDK,
//! works out which platform modules the archive needs, builds a trimmed
//! runtime with exactly those modules, and packages runtime, archive and a
//! launcher into a single file. Every intermediate file is removed on every
//! exit path.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
