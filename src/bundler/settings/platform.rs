//! Target platform and packaging choices.

use std::{fmt, str::FromStr};

/// Operating system the artifact is built for.
///
/// macOS is not a supported target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    /// Linux, ELF or self-extracting shell artifact
    Linux,
    /// Windows, `.exe` artifact
    Windows,
}

impl TargetPlatform {
    /// Platform of the running host, if supported.
    pub fn host() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(Self::Windows)
        } else if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else {
            None
        }
    }

    /// File name of the final artifact for `name`.
    pub fn artifact_file_name(self, name: &str) -> String {
        match self {
            Self::Windows => format!("{name}.exe"),
            Self::Linux => name.to_string(),
        }
    }

    /// Java launcher executable inside a runtime image's `bin` directory.
    pub fn java_executable(self, console: ConsoleMode) -> &'static str {
        match (self, console) {
            (Self::Windows, ConsoleMode::Windowed) => "javaw.exe",
            (Self::Windows, ConsoleMode::Console) => "java.exe",
            (Self::Linux, _) => "java",
        }
    }

    /// Lowercase identifier used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "windows" | "win" => Ok(Self::Windows),
            "macos" | "darwin" | "osx" => {
                Err("macOS is not a supported target platform".to_string())
            }
            other => Err(format!(
                "Invalid platform: {other}. Valid platforms: linux, windows"
            )),
        }
    }
}

/// Whether the artifact opens a console window.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConsoleMode {
    /// Attach to / open a console
    #[default]
    Console,
    /// GUI application without a console
    Windowed,
}

/// Collaborator that turns the staging tree into one executable.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackagerKind {
    /// PyInstaller when available, otherwise the built-in shell packager
    #[default]
    Auto,
    /// PyInstaller `--onefile`
    PyInstaller,
    /// Built-in self-extracting shell stub
    Shell,
}

impl FromStr for PackagerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "pyinstaller" => Ok(Self::PyInstaller),
            "shell" => Ok(Self::Shell),
            other => Err(format!(
                "Invalid packager: {other}. Valid packagers: auto, pyinstaller, shell"
            )),
        }
    }
}
