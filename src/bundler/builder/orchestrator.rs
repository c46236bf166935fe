//! Main pipeline orchestration.
//!
//! This module provides the [`Bundler`] orchestrator that runs the stages in
//! order (locate JDK, analyse dependencies, build runtime image, assemble
//! artifact) inside one cleanup region.

use crate::{
    bundler::{
        ArchiveKind, Error, PackagingRequest, Result,
        assembler::{self, LauncherFlavor, Packager, StagingLayout, packager},
        cleanup::CleanupManager,
        modules::{self, ModuleResolution},
        runtime::{self, ImageOptions},
        toolchain::{JdkCandidate, JdkLocator},
    },
    metadata::{self, ArchiveMetadata},
};
use std::{future::Future, path::Path, sync::Arc};

use super::{BundledArtifact, checksum::calculate_sha256};

/// Main pipeline orchestrator.
///
/// Every run gets its own [`CleanupManager`]; all transient paths are
/// registered with it before they are created and removed once the run
/// ends, whether it succeeded, failed or was interrupted.
///
/// # Examples
///
/// ```no_run
/// use jarpack::bundler::{Bundler, RequestBuilder};
///
/// # async fn example() -> jarpack::bundler::Result<()> {
/// let request = RequestBuilder::new()
///     .archive("target/app.jar")
///     .extra_modules(["java.sql"])
///     .build()?;
///
/// let artifact = Bundler::new(request).bundle().await?;
/// println!("Created {} ({} bytes)", artifact.path.display(), artifact.size);
/// # Ok(())
/// # }
/// ```
pub struct Bundler {
    request: PackagingRequest,
    locator: Arc<JdkLocator>,
    packager: Option<Box<dyn Packager>>,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("request", &self.request)
            .field("locator", &self.locator)
            .field("packager", &self.packager.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl Bundler {
    /// Creates a bundler with the default JDK probes and packager selection.
    pub fn new(request: PackagingRequest) -> Self {
        Self {
            request,
            locator: Arc::new(JdkLocator::default()),
            packager: None,
        }
    }

    /// Replaces the JDK locator.
    pub fn with_locator(mut self, locator: JdkLocator) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    /// Uses `packager` instead of selecting one from the request.
    pub fn with_packager(mut self, packager: Box<dyn Packager>) -> Self {
        self.packager = Some(packager);
        self
    }

    /// The request this bundler runs.
    pub fn request(&self) -> &PackagingRequest {
        &self.request
    }

    /// Runs the Toolchain Locator alone.
    ///
    /// Detection spawns `java -version` and friends, so it runs on the
    /// blocking pool.
    pub async fn locate(&self) -> Result<JdkCandidate> {
        let locator = Arc::clone(&self.locator);
        let jdk_override = self.request.jdk_override().map(Path::to_path_buf);
        tokio::task::spawn_blocking(move || locator.locate(jdk_override.as_deref()))
            .await
            .map_err(|e| Error::GenericError(format!("JDK lookup task panicked: {e}")))?
    }

    /// Chooses a packager for the request; detection runs tools.
    async fn select_packager(&self) -> Result<Box<dyn Packager>> {
        let kind = self.request.packager();
        let platform = self.request.target_platform();
        tokio::task::spawn_blocking(move || packager::select(kind, platform))
            .await
            .map_err(|e| Error::GenericError(format!("packager selection task panicked: {e}")))?
    }

    /// Runs the full pipeline.
    pub async fn bundle(&self) -> Result<BundledArtifact> {
        self.bundle_until(std::future::pending()).await
    }

    /// Runs the full pipeline, abandoning it when `interrupt` completes.
    ///
    /// On interruption the in-flight stage is dropped (killing any external
    /// tool), cleanup runs, and `Error::Interrupted` is returned.
    pub async fn bundle_until<F>(&self, interrupt: F) -> Result<BundledArtifact>
    where
        F: Future<Output = ()>,
    {
        let mut cleanup = CleanupManager::new();
        let outcome = tokio::select! {
            biased;
            () = interrupt => {
                log::warn!("Interrupted, cleaning up");
                Err(Error::Interrupted)
            }
            result = self.run_pipeline(&mut cleanup) => result,
        };
        release(cleanup).await;
        outcome
    }

    /// Runs only locating and dependency analysis.
    pub async fn resolve_modules_until<F>(
        &self,
        interrupt: F,
    ) -> Result<(JdkCandidate, ModuleResolution)>
    where
        F: Future<Output = ()>,
    {
        let mut cleanup = CleanupManager::new();
        let outcome = tokio::select! {
            biased;
            () = interrupt => {
                log::warn!("Interrupted, cleaning up");
                Err(Error::Interrupted)
            }
            result = self.run_analysis(&mut cleanup) => result,
        };
        release(cleanup).await;
        outcome
    }

    async fn run_analysis(
        &self,
        cleanup: &mut CleanupManager,
    ) -> Result<(JdkCandidate, ModuleResolution)> {
        let archive = self.inspect_archive().await?;
        let jdk = self.locate().await?;
        let layout = StagingLayout::for_request(&self.request, LauncherFlavor::Posix);
        layout.create(cleanup).await?;
        let resolution =
            modules::resolve_modules(&self.request, &archive, &jdk, layout.analysis_dir()).await?;
        Ok((jdk, resolution))
    }

    async fn run_pipeline(&self, cleanup: &mut CleanupManager) -> Result<BundledArtifact> {
        let request = &self.request;

        let archive = self.inspect_archive().await?;
        let jdk = self.locate().await?;

        let selected: Box<dyn Packager>;
        let packager: &dyn Packager = match &self.packager {
            Some(packager) => packager.as_ref(),
            None => {
                selected = self.select_packager().await?;
                selected.as_ref()
            }
        };

        let layout = StagingLayout::for_request(request, packager.launcher_flavor());
        layout.create(cleanup).await?;

        log::info!("Analysing dependencies of {}", request.archive_file_name());
        let resolution =
            modules::resolve_modules(request, &archive, &jdk, layout.analysis_dir()).await?;

        runtime::build_runtime(
            &jdk,
            &resolution.modules,
            layout.runtime_dir(),
            ImageOptions {
                strip_debug: request.strip_debug(),
            },
            request.timeouts().image,
        )
        .await?;

        let path = assembler::assemble(request, &layout, packager, cleanup).await?;

        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::PackagingFailed {
                reason: format!("reading artifact metadata: {e}"),
                output: String::new(),
            })?
            .len();
        let sha256 = calculate_sha256(&path).await?;

        Ok(BundledArtifact {
            path,
            size,
            sha256,
            modules: resolution.modules,
            module_source: resolution.source,
            jdk_home: jdk.installation_path,
            jdk_version: jdk.version,
            packager: packager.name().to_string(),
        })
    }

    /// Reads the archive's manifest and module information.
    ///
    /// Read-only; runs before anything is written.
    async fn inspect_archive(&self) -> Result<ArchiveMetadata> {
        let path = self.request.archive_path().to_path_buf();
        let kind = self.request.archive_kind();
        let archive = tokio::task::spawn_blocking(move || metadata::inspect_archive(&path, kind))
            .await
            .map_err(|e| Error::GenericError(format!("archive inspection task panicked: {e}")))??;

        let launchable = archive.main_class.is_some()
            || match kind {
                ArchiveKind::Jar => self.request.main_class().is_some(),
                ArchiveKind::War => self.request.war_runner().is_some(),
            };
        if !launchable {
            let hint = match kind {
                ArchiveKind::Jar => "pass --main-class",
                ArchiveKind::War => "pass --war-runner",
            };
            return Err(Error::InvalidArchive {
                path: self.request.archive_path().to_path_buf(),
                reason: format!("manifest has no Main-Class; {hint}"),
            });
        }
        if archive.modular {
            log::info!("Archive declares module information");
        }
        Ok(archive)
    }
}

async fn release(cleanup: CleanupManager) {
    let report = cleanup.release().await;
    if let Some(incomplete) = report.incomplete() {
        log::warn!("{incomplete}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{RequestBuilder, TargetPlatform};
    use std::io::Write;

    fn jar_without_main_class(path: &std::path::Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("META-INF/MANIFEST.MF", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"Manifest-Version: 1.0\r\n\r\n").unwrap();
        zip.finish().unwrap();
    }

    #[tokio::test]
    async fn missing_main_class_is_rejected_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lib.jar");
        jar_without_main_class(&jar);
        let work = dir.path().join("work");
        std::fs::create_dir(&work).unwrap();

        let request = RequestBuilder::new()
            .archive(&jar)
            .target_platform(TargetPlatform::Linux)
            .work_dir(&work)
            .output_dir(dir.path().join("dist"))
            .build()
            .unwrap();
        let err = Bundler::new(request)
            .with_locator(JdkLocator::with_probes(Vec::new()))
            .bundle()
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 64);
        assert!(err.to_string().contains("--main-class"));
        assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);
        assert!(!dir.path().join("dist").exists());
    }

    #[tokio::test]
    async fn interrupt_wins_over_a_pending_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lib.jar");
        jar_without_main_class(&jar);
        let request = RequestBuilder::new()
            .archive(&jar)
            .target_platform(TargetPlatform::Linux)
            .main_class("com.example.Main")
            .work_dir(dir.path())
            .build()
            .unwrap();

        let err = Bundler::new(request)
            .with_locator(JdkLocator::with_probes(Vec::new()))
            .bundle_until(std::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }

    #[tokio::test]
    async fn interrupt_wins_analysis_too() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lib.jar");
        jar_without_main_class(&jar);
        let request = RequestBuilder::new()
            .archive(&jar)
            .target_platform(TargetPlatform::Linux)
            .work_dir(dir.path())
            .build()
            .unwrap();

        // Without the interrupt this run fails fast on the missing Main-Class.
        let err = Bundler::new(request)
            .with_locator(JdkLocator::with_probes(Vec::new()))
            .resolve_modules_until(std::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }
}
