//! File system utilities for bundling.
//!
//! Provides file copies with automatic directory creation, executable bits,
//! and removal that tolerates files held open by a just-exited process.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::fs;

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying to", to)?;
    Ok(())
}

/// Writes `content` to `path` and marks it executable on Unix.
pub async fn write_executable(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content)
        .await
        .fs_context("writing", path)?;
    set_executable(path).await
}

/// Sets mode 0755 on Unix; a no-op elsewhere.
pub async fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .fs_context("setting permissions on", path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Whether `path` is a non-empty file that can be executed.
pub fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() || metadata.len() == 0 {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Bounded retry schedule for removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Delay before the second attempt; doubles after every failure
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_backoff: Duration::from_millis(50),
        }
    }
}

/// Removes a file or directory tree, retrying transient failures.
///
/// A path that does not exist counts as removed. Blocks the calling thread
/// between attempts, so async callers go through `spawn_blocking`.
pub fn remove_path_with_retry(path: &Path, policy: RetryPolicy) -> io::Result<()> {
    let mut backoff = policy.initial_backoff;
    let mut attempt = 1;
    loop {
        match remove_path(path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt >= policy.attempts => return Err(e),
            Err(e) => {
                log::debug!(
                    "Removing {} failed (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    policy.attempts,
                    e
                );
                std::thread::sleep(backoff);
                backoff = backoff.saturating_mul(2);
                attempt += 1;
            }
        }
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = std::fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Lists the entries of `dir` by [`version_sort_key`], highest first.
///
/// Missing or unreadable directories produce an empty list.
pub fn sorted_dir_entries_desc(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    paths.sort_by_cached_key(|p| std::cmp::Reverse(version_sort_key(p)));
    paths
}

/// Sort key comparing the numbers in a file name numerically, so `jdk-17`
/// ranks above `jdk-9`. The full name breaks ties.
pub fn version_sort_key(path: &Path) -> (Vec<u64>, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let numbers = name
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| run.parse().unwrap_or(u64::MAX))
        .collect();
    (numbers, name)
}
