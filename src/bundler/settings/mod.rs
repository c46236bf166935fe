//! Configuration structures for a packaging run.
//!
//! A [`PackagingRequest`] is assembled once through [`RequestBuilder`] and
//! shared read-only by every pipeline stage.

mod builder;
mod core;
mod platform;

pub use builder::RequestBuilder;
pub use core::{ArchiveKind, PackagingRequest, Timeouts};
pub use platform::{ConsoleMode, PackagerKind, TargetPlatform};
