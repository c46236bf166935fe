//! The packaging pipeline.
//!
//! Stages, leaf first:
//!
//! - [`toolchain`] - find an eligible JDK
//! - [`modules`] - resolve the platform modules the archive needs
//! - [`runtime`] - build a trimmed runtime image with jlink
//! - [`assembler`] - stage runtime, archive and launcher; package; commit
//! - [`cleanup`] - remove every transient path on every exit path
//!
//! [`Bundler`] runs them in order for one [`PackagingRequest`].

pub mod assembler;
mod builder;
pub mod cleanup;
pub mod error;
pub mod modules;
pub mod runtime;
pub mod settings;
pub mod toolchain;
pub mod utils;

pub use builder::{BundledArtifact, Bundler};
pub use error::{Context, Error, ErrorExt, Result};
pub use settings::{
    ArchiveKind, ConsoleMode, PackagerKind, PackagingRequest, RequestBuilder, TargetPlatform,
    Timeouts,
};
