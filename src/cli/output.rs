//! User-facing terminal output.
//!
//! Diagnostics go through `log`; this is for the messages a user running the
//! tool reads: section headers, results and errors.

use console::{Style, Term};

/// Styled terminal output honouring `--verbose` and `--quiet`.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    stdout: Term,
    stderr: Term,
}

impl OutputManager {
    /// Creates an output manager writing to the process's terminals.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            stdout: Term::stdout(),
            stderr: Term::stderr(),
        }
    }

    /// Section header.
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let style = Style::new().bold().cyan();
        self.stdout.write_line(&format!("{}", style.apply_to(title)))
    }

    /// Success line.
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mark = Style::new().green().bold().apply_to("✓");
        self.stdout.write_line(&format!("{mark} {message}"))
    }

    /// Error, on stderr.
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        let label = Style::new().red().bold().apply_to("error:");
        self.stderr.write_line(&format!("{label} {message}"))
    }

    /// Indented detail line.
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&format!("  {message}"))
    }

    /// Detail shown only with `--verbose`.
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        let dim = Style::new().dim();
        self.stdout.write_line(&format!("{}", dim.apply_to(message)))
    }

    /// Plain result line for scripting; shown even when quiet.
    pub fn result(&self, message: &str) -> std::io::Result<()> {
        self.stdout.write_line(message)
    }
}
