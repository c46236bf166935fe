//! The launcher contract.
//!
//! A launcher is the small entry point bundled with the runtime and the
//! archive. At run time it locates both relative to its own location, starts
//! the embedded `java` against the archive with any user arguments appended,
//! and exits with the JVM's exit status.

use super::templates::{POSIX_LAUNCHER, PYTHON_LAUNCHER};
use crate::bundler::{ArchiveKind, PackagingRequest, Result};
use handlebars::Handlebars;
use std::collections::BTreeMap;

/// Name of the runtime image directory inside the bundle.
pub const RUNTIME_DIR: &str = "runtime";

/// Directory holding a bundled WAR runner.
pub const RUNNER_DIR: &str = "runner";

/// Language the launcher is generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherFlavor {
    /// `/bin/sh` script
    Posix,
    /// Python script frozen by PyInstaller
    Python,
}

impl LauncherFlavor {
    /// File name of the launcher inside the bundle.
    pub fn file_name(self) -> &'static str {
        match self {
            LauncherFlavor::Posix => "launcher.sh",
            LauncherFlavor::Python => "launcher.py",
        }
    }
}

/// One argument of the generated `java` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchArg {
    /// Path relative to the bundle root, resolved at run time
    Bundled(String),
    /// Passed through unchanged
    Literal(String),
}

/// What the launcher runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    name: String,
    java: &'static str,
    args: Vec<LaunchArg>,
}

impl LaunchSpec {
    /// Derives the command line for `request`.
    ///
    /// - WAR with a runner: `java [jvm args] -jar runner/<runner> <war>`
    /// - JAR with an explicit main class: `java [jvm args] -cp <jar> <class>`
    /// - otherwise: `java [jvm args] -jar <archive>`
    pub fn for_request(request: &PackagingRequest) -> Self {
        let archive = LaunchArg::Bundled(request.archive_file_name());
        let mut args: Vec<LaunchArg> = request
            .jvm_args()
            .iter()
            .cloned()
            .map(LaunchArg::Literal)
            .collect();

        match (request.archive_kind(), runner_path(request), request.main_class()) {
            (ArchiveKind::War, Some(runner), _) => {
                args.push(LaunchArg::Literal("-jar".into()));
                args.push(LaunchArg::Bundled(runner));
                args.push(archive);
            }
            (ArchiveKind::Jar, _, Some(main_class)) => {
                args.push(LaunchArg::Literal("-cp".into()));
                args.push(archive);
                args.push(LaunchArg::Literal(main_class.to_string()));
            }
            _ => {
                args.push(LaunchArg::Literal("-jar".into()));
                args.push(archive);
            }
        }

        Self {
            name: request.output_name().to_string(),
            java: request
                .target_platform()
                .java_executable(request.console()),
            args,
        }
    }

    /// Executable name inside `runtime/bin`.
    pub fn java(&self) -> &str {
        self.java
    }

    /// Arguments after the `java` executable.
    pub fn args(&self) -> &[LaunchArg] {
        &self.args
    }

    /// Human-readable command line, for logs.
    pub fn describe(&self) -> String {
        let mut line = format!("{RUNTIME_DIR}/bin/{}", self.java);
        for arg in &self.args {
            line.push(' ');
            match arg {
                LaunchArg::Bundled(path) | LaunchArg::Literal(path) => line.push_str(path),
            }
        }
        line
    }

    /// Renders the launcher source in `flavor`.
    pub fn render(&self, flavor: LauncherFlavor) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        let (template, name, words): (&str, String, Vec<String>) = match flavor {
            LauncherFlavor::Posix => (
                POSIX_LAUNCHER,
                sh_quote(&self.name),
                self.args.iter().map(posix_word).collect(),
            ),
            LauncherFlavor::Python => (
                PYTHON_LAUNCHER,
                json_string(&self.name),
                self.args.iter().map(python_word).collect(),
            ),
        };
        handlebars.register_template_string("launcher", template)?;

        let mut data = BTreeMap::new();
        data.insert("name", serde_json::Value::from(name));
        data.insert("runtime_dir", serde_json::Value::from(RUNTIME_DIR));
        data.insert("java", serde_json::Value::from(self.java));
        data.insert("words", serde_json::Value::from(words));

        Ok(handlebars.render("launcher", &data)?)
    }
}

/// Bundle-relative path of the WAR runner, if one is bundled.
pub fn runner_path(request: &PackagingRequest) -> Option<String> {
    let runner = request.war_runner()?;
    let file = runner.file_name()?.to_string_lossy();
    Some(format!("{RUNNER_DIR}/{file}"))
}

fn posix_word(arg: &LaunchArg) -> String {
    match arg {
        LaunchArg::Bundled(path) => format!("\"$BASE\"/{}", sh_quote(path)),
        LaunchArg::Literal(value) => sh_quote(value),
    }
}

fn python_word(arg: &LaunchArg) -> String {
    // A JSON string literal is also a valid Python string literal.
    match arg {
        LaunchArg::Bundled(path) => format!("str(base / {})", json_string(path)),
        LaunchArg::Literal(value) => json_string(value),
    }
}

fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Single-quotes `value` for `/bin/sh`.
pub fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
