//! Dependency analysis: which platform modules does the archive need?
//!
//! Runs jdeps against the archive (or, for a WAR, against its classes and
//! bundled libraries), interprets the listing and merges the user's extra
//! modules. Classic class-path archives whose requirements jdeps cannot
//! determine get [`DEFAULT_BASELINE`]; modular archives never do.

pub mod parse;
mod set;

pub use parse::{Interpretation, ListingMode};
pub use set::{DEFAULT_BASELINE, ModuleSet};

use crate::{
    bundler::{
        ArchiveKind, Error, PackagingRequest, Result,
        toolchain::JdkCandidate,
        utils::process::{self, ToolInvocation, ToolOutput},
    },
    metadata::{self, ArchiveMetadata},
};
use std::path::{Path, PathBuf};

/// How the module set was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionSource {
    /// Listed by jdeps
    Analyzed,
    /// Default baseline for a classic archive
    Baseline,
    /// Every module of the JDK (`--all-modules`)
    AllModules,
}

/// Outcome of dependency analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResolution {
    /// Modules for the runtime image
    pub modules: ModuleSet,
    /// Where they came from
    pub source: ResolutionSource,
}

/// Resolves the module set for `request`.
///
/// `scratch_dir` receives the extracted WAR; it must be inside the run's
/// tracked staging tree.
pub async fn resolve_modules(
    request: &PackagingRequest,
    archive: &ArchiveMetadata,
    jdk: &JdkCandidate,
    scratch_dir: &Path,
) -> Result<ModuleResolution> {
    let extra = request.extra_modules();

    if request.all_modules() {
        log::info!("Using all JDK modules");
        let detected = list_all_modules(jdk, request).await?;
        let modules = ModuleSet::merge(detected, extra).ok_or_else(|| {
            Error::EmptyDependencySet {
                archive: request.archive_path().to_path_buf(),
            }
        })?;
        return Ok(ModuleResolution {
            modules,
            source: ResolutionSource::AllModules,
        });
    }

    let targets = analysis_targets(request, scratch_dir).await?;
    if targets.is_empty() {
        log::info!("Archive has no classes to analyse; using the default module baseline");
        return Ok(ModuleResolution {
            modules: ModuleSet::baseline(Vec::<String>::new(), extra),
            source: ResolutionSource::Baseline,
        });
    }

    let first = run_jdeps(jdk, archive, &targets, ListingMode::PrintModuleDeps, request).await?;
    let interpretation = match parse::interpret(&first, ListingMode::PrintModuleDeps, archive.modular) {
        Interpretation::Failed => {
            log::info!("Falling back to {} mode", ListingMode::ListDeps.flag());
            let second = run_jdeps(jdk, archive, &targets, ListingMode::ListDeps, request).await?;
            match parse::interpret(&second, ListingMode::ListDeps, archive.modular) {
                Interpretation::Failed => {
                    return Err(Error::DependencyAnalysisFailed {
                        exit_code: second.exit_code,
                        output: format!("{}\n{}", first.combined(), second.combined())
                            .trim()
                            .to_string(),
                    });
                }
                other => other,
            }
        }
        other => other,
    };

    let resolution = match interpretation {
        Interpretation::Modules(detected) => ModuleResolution {
            modules: ModuleSet::merge(detected, extra).ok_or_else(|| Error::EmptyDependencySet {
                archive: request.archive_path().to_path_buf(),
            })?,
            source: ResolutionSource::Analyzed,
        },
        Interpretation::Baseline(detected) => {
            log::info!("Archive has no module information; using the default module baseline");
            ModuleResolution {
                modules: ModuleSet::baseline(detected, extra),
                source: ResolutionSource::Baseline,
            }
        }
        Interpretation::Empty | Interpretation::Failed => {
            return Err(Error::EmptyDependencySet {
                archive: request.archive_path().to_path_buf(),
            });
        }
    };

    log::info!("Resolved modules: {}", resolution.modules);
    Ok(resolution)
}

async fn analysis_targets(request: &PackagingRequest, scratch_dir: &Path) -> Result<Vec<PathBuf>> {
    match request.archive_kind() {
        ArchiveKind::Jar => Ok(vec![request.archive_path().to_path_buf()]),
        ArchiveKind::War => {
            log::info!("Extracting WAR for analysis");
            let war = request.archive_path().to_path_buf();
            let destination = scratch_dir.to_path_buf();
            tokio::task::spawn_blocking(move || metadata::extract_war_targets(&war, &destination))
                .await
                .map_err(|e| Error::GenericError(format!("WAR extraction task panicked: {e}")))?
        }
    }
}

/// Builds the jdeps command line for `mode`.
pub fn jdeps_invocation(
    jdk: &JdkCandidate,
    archive: &ArchiveMetadata,
    targets: &[PathBuf],
    mode: ListingMode,
) -> ToolInvocation {
    let mut invocation = ToolInvocation::new(jdk.tool("jdeps"));
    if archive.multi_release {
        invocation = invocation.args(["--multi-release".to_string(), jdk.version.to_string()]);
    }
    invocation.arg(mode.flag()).args(targets)
}

async fn run_jdeps(
    jdk: &JdkCandidate,
    archive: &ArchiveMetadata,
    targets: &[PathBuf],
    mode: ListingMode,
    request: &PackagingRequest,
) -> Result<ToolOutput> {
    let invocation = jdeps_invocation(jdk, archive, targets, mode);
    process::run_with_retry(&invocation, request.timeouts().analysis)
        .await
        .map_err(|failure| Error::DependencyAnalysisFailed {
            exit_code: None,
            output: failure.describe(),
        })
}

async fn list_all_modules(
    jdk: &JdkCandidate,
    request: &PackagingRequest,
) -> Result<std::collections::BTreeSet<String>> {
    let invocation = ToolInvocation::new(jdk.tool("java")).arg("--list-modules");
    let output = process::run_with_retry(&invocation, request.timeouts().analysis)
        .await
        .map_err(|failure| Error::DependencyAnalysisFailed {
            exit_code: None,
            output: failure.describe(),
        })?;
    if !output.success() {
        return Err(Error::DependencyAnalysisFailed {
            exit_code: output.exit_code,
            output: output.combined(),
        });
    }
    Ok(parse::parse_list_modules(&output.stdout))
}
