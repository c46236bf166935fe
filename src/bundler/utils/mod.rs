//! Shared helpers for filesystem work and external tool invocation.

pub mod fs;
pub mod process;
