//! Builder for constructing a [`PackagingRequest`].

use super::{ArchiveKind, ConsoleMode, PackagerKind, PackagingRequest, TargetPlatform, Timeouts};
use crate::bundler::{Error, ErrorExt, Result};
use path_absolutize::Absolutize;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

/// Builder for constructing [`PackagingRequest`].
///
/// # Examples
///
/// ```no_run
/// use jarpack::bundler::{RequestBuilder, TargetPlatform};
///
/// # fn example() -> jarpack::bundler::Result<()> {
/// let request = RequestBuilder::new()
///     .archive("build/libs/app.jar")
///     .output_name("app")
///     .target_platform(TargetPlatform::Windows)
///     .extra_modules(["java.sql"])
///     .build()?;
/// assert!(request.output_path().ends_with("dist/app.exe"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RequestBuilder {
    archive: Option<PathBuf>,
    output_name: Option<String>,
    output_dir: Option<PathBuf>,
    target_platform: Option<TargetPlatform>,
    jdk_override: Option<PathBuf>,
    extra_modules: Vec<String>,
    all_modules: bool,
    packager: PackagerKind,
    console: ConsoleMode,
    icon: Option<PathBuf>,
    main_class: Option<String>,
    war_runner: Option<PathBuf>,
    jvm_args: Vec<String>,
    strip_debug: bool,
    work_dir: Option<PathBuf>,
    timeouts: Timeouts,
}

impl RequestBuilder {
    /// Creates a new request builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the input archive.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn archive<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the artifact base name. Default: the archive's file stem.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Sets the artifact directory. Default: `dist`.
    pub fn output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets the target platform. Default: the host platform.
    pub fn target_platform(mut self, platform: TargetPlatform) -> Self {
        self.target_platform = Some(platform);
        self
    }

    /// Uses exactly this JDK; auto-detection is disabled.
    pub fn jdk_override<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.jdk_override = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds modules to include on top of the analysed set.
    pub fn extra_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_modules.extend(modules.into_iter().map(Into::into));
        self
    }

    /// Includes every JDK module instead of analysing the archive.
    pub fn all_modules(mut self, all: bool) -> Self {
        self.all_modules = all;
        self
    }

    /// Selects the packaging collaborator. Default: [`PackagerKind::Auto`].
    pub fn packager(mut self, packager: PackagerKind) -> Self {
        self.packager = packager;
        self
    }

    /// Console or windowed artifact. Default: console.
    pub fn console(mut self, console: ConsoleMode) -> Self {
        self.console = console;
        self
    }

    /// Sets the artifact icon.
    pub fn icon<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.icon = Some(path.as_ref().to_path_buf());
        self
    }

    /// Launches this class instead of the manifest's `Main-Class`.
    pub fn main_class(mut self, class: impl Into<String>) -> Self {
        self.main_class = Some(class.into());
        self
    }

    /// Bundles a servlet container runner used to launch a WAR.
    pub fn war_runner<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.war_runner = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds JVM arguments.
    pub fn jvm_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.jvm_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Strips debug information from the runtime image.
    pub fn strip_debug(mut self, strip: bool) -> Self {
        self.strip_debug = strip;
        self
    }

    /// Sets the base directory for per-run staging directories.
    ///
    /// Default: the system temporary directory.
    pub fn work_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets tool time limits.
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// - `InvalidArchive` if the archive is missing, not a file, or not a JAR/WAR
    /// - `GenericError` for an unusable output name, a missing runner or icon,
    ///   or an unsupported host when no platform is given
    pub fn build(self) -> Result<PackagingRequest> {
        let archive = self
            .archive
            .ok_or_else(|| Error::GenericError("archive is required".into()))?;
        let archive_path = absolute(&archive)?;
        if !archive_path.is_file() {
            return Err(Error::InvalidArchive {
                path: archive,
                reason: "file not found".into(),
            });
        }
        let archive_kind = ArchiveKind::from_path(&archive_path)?;

        let output_name = match self.output_name {
            Some(name) => name,
            None => default_output_name(&archive_path),
        };
        validate_output_name(&output_name)?;

        let target_platform = match self.target_platform {
            Some(platform) => platform,
            None => TargetPlatform::host().ok_or_else(|| {
                Error::GenericError(
                    "host platform is not a supported target; pass an explicit platform".into(),
                )
            })?,
        };

        let extra_modules: BTreeSet<String> = self
            .extra_modules
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        let war_runner = match self.war_runner {
            Some(runner) if archive_kind == ArchiveKind::War => Some(existing_file(&runner, "WAR runner")?),
            Some(_) => {
                log::warn!("Ignoring WAR runner: input archive is a JAR");
                None
            }
            None => None,
        };
        let icon = self
            .icon
            .map(|icon| existing_file(&icon, "icon"))
            .transpose()?;

        let output_dir = absolute(self.output_dir.as_deref().unwrap_or(Path::new("dist")))?;
        let work_dir = match self.work_dir {
            Some(dir) => absolute(&dir)?,
            None => temp_dir_base(),
        };
        let jdk_override = self.jdk_override.map(|p| absolute(&p)).transpose()?;

        Ok(PackagingRequest {
            archive_path,
            archive_kind,
            output_name,
            output_dir,
            target_platform,
            jdk_override,
            extra_modules,
            all_modules: self.all_modules,
            packager: self.packager,
            console: self.console,
            icon,
            main_class: self.main_class.filter(|c| !c.trim().is_empty()),
            war_runner,
            jvm_args: self.jvm_args,
            strip_debug: self.strip_debug,
            work_dir,
            timeouts: self.timeouts,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .fs_context("resolving path", path)?
        .into_owned())
}

fn existing_file(path: &Path, what: &str) -> Result<PathBuf> {
    let resolved = absolute(path)?;
    if resolved.is_file() {
        Ok(resolved)
    } else {
        Err(Error::GenericError(format!(
            "{what} not found: {}",
            path.display()
        )))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Output names end up in file names and generated launcher code, so they
/// are limited to `[A-Za-z0-9._-]` and may not start with `-`.
fn validate_output_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.starts_with('-')
        || !name.chars().all(is_name_char)
    {
        return Err(Error::GenericError(format!(
            "invalid output name {name:?}: use only letters, digits, '.', '_' and '-'"
        )));
    }
    Ok(())
}

/// The archive's file stem with every other character replaced by `-`.
fn default_output_name(archive: &Path) -> String {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem
        .chars()
        .map(|c| if is_name_char(c) { c } else { '-' })
        .collect();
    match name.trim_start_matches('-') {
        "" | "." | ".." => "app".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Directory for temporary staging trees; never relative to the working directory.
fn temp_dir_base() -> PathBuf {
    let t = std::env::temp_dir();
    if t.is_absolute() {
        t
    } else if cfg!(windows) {
        PathBuf::from("C:\\Windows\\Temp")
    } else {
        PathBuf::from("/tmp")
    }
}
