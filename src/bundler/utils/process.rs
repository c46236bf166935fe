//! External tool invocation with captured output and a bounded run time.
//!
//! Spawning lives here so that every stage deals only with [`ToolOutput`]
//! values, which keeps their parsing logic testable against recorded output.

use std::{
    ffi::{OsStr, OsString},
    fmt,
    io::Read,
    path::{Path, PathBuf},
    process::Stdio,
    thread::JoinHandle,
    time::Duration,
};
use tokio::process::Command;
use wait_timeout::ChildExt;

/// Time limit for quick queries such as `java -version`.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// A fully described external command.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ToolInvocation {
    /// Creates an invocation of `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Sets the working directory of the child.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program being invoked.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the program.
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Short tool name for messages (file stem of the program).
    pub fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a tool that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the tool exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Standard output followed by standard error, as shown to users.
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// A tool that never produced a [`ToolOutput`].
#[derive(Debug)]
pub enum ToolFailure {
    /// The program could not be started.
    Spawn {
        /// Rendered command line
        command: String,
        /// Spawn error
        error: std::io::Error,
    },
    /// The program did not finish within its time limit and was killed.
    TimedOut {
        /// Rendered command line
        command: String,
        /// Time limit that elapsed
        after: Duration,
    },
}

impl ToolFailure {
    /// Human readable description used as the stage's captured output.
    pub fn describe(&self) -> String {
        match self {
            ToolFailure::Spawn { command, error } => format!("failed to start `{command}`: {error}"),
            ToolFailure::TimedOut { command, after } => {
                format!("`{command}` timed out after {}s and was killed", after.as_secs())
            }
        }
    }

    /// Whether this failure is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ToolFailure::TimedOut { .. })
    }
}

/// Runs a tool to completion, killing it once `timeout` elapses.
pub async fn run(invocation: &ToolInvocation, timeout: Duration) -> Result<ToolOutput, ToolFailure> {
    log::debug!("Running: {}", invocation);

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &invocation.current_dir {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|error| ToolFailure::Spawn {
        command: invocation.to_string(),
        error,
    })?;

    // Dropping the output future on timeout drops the child, which kills it.
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let output = ToolOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            log::debug!(
                "{} exited with {:?}",
                invocation.tool_name(),
                output.exit_code
            );
            Ok(output)
        }
        Ok(Err(error)) => Err(ToolFailure::Spawn {
            command: invocation.to_string(),
            error,
        }),
        Err(_elapsed) => Err(ToolFailure::TimedOut {
            command: invocation.to_string(),
            after: timeout,
        }),
    }
}

/// Runs a tool, retrying exactly once if the first attempt timed out.
///
/// Non-timeout failures are deterministic for identical inputs and are
/// returned immediately.
pub async fn run_with_retry(
    invocation: &ToolInvocation,
    timeout: Duration,
) -> Result<ToolOutput, ToolFailure> {
    match run(invocation, timeout).await {
        Err(failure) if failure.is_timeout() => {
            log::warn!("{}; retrying once", failure.describe());
            run(invocation, timeout).await
        }
        other => other,
    }
}

/// Blocking counterpart of [`run`] for synchronous callers.
///
/// Both pipes are drained on helper threads so a chatty child cannot stall
/// on a full pipe while we wait on it.
pub fn run_blocking(invocation: &ToolInvocation, timeout: Duration) -> Result<ToolOutput, ToolFailure> {
    log::debug!("Running: {}", invocation);
    let spawn_failure = |error| ToolFailure::Spawn {
        command: invocation.to_string(),
        error,
    };

    let mut command = std::process::Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &invocation.current_dir {
        command.current_dir(dir);
    }
    let mut child = command.spawn().map_err(spawn_failure)?;
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    match child.wait_timeout(timeout) {
        Ok(Some(status)) => Ok(ToolOutput {
            exit_code: status.code(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        }),
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(ToolFailure::TimedOut {
                command: invocation.to_string(),
                after: timeout,
            })
        }
        Err(error) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(spawn_failure(error))
        }
    }
}

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = reader.and_then(|r| r.join().ok()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_joins_non_empty_streams() {
        let out = ToolOutput {
            exit_code: Some(1),
            stdout: "java.base\n".into(),
            stderr: "Warning: split package\n".into(),
        };
        assert_eq!(out.combined(), "java.base\nWarning: split package");

        let only_err = ToolOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "boom\n".into(),
        };
        assert_eq!(only_err.combined(), "boom");
    }

    #[test]
    fn invocation_renders_command_line() {
        let inv = ToolInvocation::new("/jdk/bin/jlink").args(["--add-modules", "java.base"]);
        assert_eq!(inv.to_string(), "/jdk/bin/jlink --add-modules java.base");
        assert_eq!(inv.tool_name(), "jlink");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let inv = ToolInvocation::new("/definitely/not/a/real/tool");
        let failure = run(&inv, Duration::from_secs(5)).await.unwrap_err();
        assert!(!failure.is_timeout());
        assert!(failure.describe().contains("failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_exit_code_and_streams() {
        let inv = ToolInvocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = run(&inv, Duration::from_secs(10)).await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let inv = ToolInvocation::new("sh").args(["-c", "sleep 5"]);
        let failure = run_with_retry(&inv, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(failure.is_timeout());
    }

    #[cfg(unix)]
    #[test]
    fn blocking_run_captures_output() {
        let inv = ToolInvocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = run_blocking(&inv, Duration::from_secs(10)).unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn blocking_run_kills_a_hung_tool() {
        let inv = ToolInvocation::new("sh").args(["-c", "exec sleep 30"]);
        let started = std::time::Instant::now();
        let failure = run_blocking(&inv, Duration::from_millis(200)).unwrap_err();
        assert!(failure.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn blocking_run_reports_missing_program() {
        let inv = ToolInvocation::new("/definitely/not/a/real/tool");
        let failure = run_blocking(&inv, QUERY_TIMEOUT).unwrap_err();
        assert!(!failure.is_timeout());
    }
}
