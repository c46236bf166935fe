//! Scoped removal of every transient artifact a run creates.
//!
//! A [`CleanupManager`] is created before the first stage and released after
//! the last one, whatever the outcome. Paths are registered *before* they are
//! created, so a failure between registration and creation still leaves
//! nothing behind. [`CleanupManager::release`] consumes the manager, which
//! makes double release impossible; if a run unwinds before reaching it,
//! `Drop` performs the same removal synchronously.

use crate::bundler::utils::fs::{RetryPolicy, remove_path_with_retry};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Tracks transient paths and removes them exactly once.
#[derive(Debug, Default)]
pub struct CleanupManager {
    tracked: Vec<PathBuf>,
    policy: RetryPolicy,
    released: bool,
}

impl CleanupManager {
    /// Creates a manager with the default retry policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with a custom retry policy.
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            tracked: Vec::new(),
            policy,
            released: false,
        }
    }

    /// Registers a path for removal. Registering the same path twice is a no-op.
    pub fn track(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        if !self.tracked.contains(&path) {
            log::debug!("Tracking transient path {}", path.display());
            self.tracked.push(path);
        }
    }

    /// Paths currently registered, in registration order.
    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Removes every tracked path, most recently registered first.
    ///
    /// Never fails: paths that could not be removed after the retry budget
    /// are returned in the report for the caller to log.
    pub async fn release(mut self) -> CleanupReport {
        let tracked = std::mem::take(&mut self.tracked);
        let policy = self.policy;
        self.released = true;

        match tokio::task::spawn_blocking(move || remove_all(tracked, policy)).await {
            Ok(report) => report,
            Err(e) => CleanupReport {
                removed: Vec::new(),
                residual: vec![(PathBuf::new(), format!("cleanup task panicked: {e}"))],
            },
        }
    }
}

impl Drop for CleanupManager {
    fn drop(&mut self) {
        if self.released || self.tracked.is_empty() {
            return;
        }
        let report = remove_all(std::mem::take(&mut self.tracked), self.policy);
        if let Some(incomplete) = report.incomplete() {
            log::warn!("{}", incomplete);
        }
    }
}

fn remove_all(tracked: Vec<PathBuf>, policy: RetryPolicy) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in tracked.into_iter().rev() {
        match remove_path_with_retry(&path, policy) {
            Ok(()) => {
                log::debug!("Removed {}", path.display());
                report.removed.push(path);
            }
            Err(e) => report.residual.push((path, e.to_string())),
        }
    }
    report
}

/// Outcome of a cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Paths that no longer exist
    pub removed: Vec<PathBuf>,
    /// Paths that survived every attempt, with the last error
    pub residual: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    /// The warning to log when something survived, `None` when clean.
    pub fn incomplete(&self) -> Option<CleanupIncomplete<'_>> {
        (!self.residual.is_empty()).then_some(CleanupIncomplete {
            residual: &self.residual,
        })
    }
}

/// Non-fatal warning: some transient paths could not be removed.
#[derive(Debug)]
pub struct CleanupIncomplete<'a> {
    residual: &'a [(PathBuf, String)],
}

impl fmt::Display for CleanupIncomplete<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cleanup incomplete; remove these manually:")?;
        for (path, reason) in self.residual {
            write!(f, "\n  {} ({})", path.display(), reason)?;
        }
        Ok(())
    }
}
