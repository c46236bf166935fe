//! Parsing of jdeps and `java --list-modules` output.
//!
//! All functions here are pure so they can be checked against recorded tool
//! output. Lines that do not look like module listings are ignored, which
//! keeps the parser working across analyzer output changes.

use crate::bundler::utils::process::ToolOutput;
use regex::Regex;
use std::{collections::BTreeSet, sync::LazyLock};

static MODULE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)+$").expect("valid regex")
});

/// Diagnostics jdeps prints for class-path archives it cannot fully resolve.
const NON_MODULAR_MARKERS: &[&str] = &[
    "missing dependencies",
    "not found",
    "unnamed module",
    "is not a module",
    "automatic module",
];

/// Which jdeps listing produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    /// `--print-module-deps`: one comma-separated line
    PrintModuleDeps,
    /// `--list-deps`: one indented module (or module/package) per line
    ListDeps,
}

impl ListingMode {
    /// The jdeps flag selecting this mode.
    pub fn flag(self) -> &'static str {
        match self {
            ListingMode::PrintModuleDeps => "--print-module-deps",
            ListingMode::ListDeps => "--list-deps",
        }
    }
}

/// Whether `token` is a platform module name such as `java.base`.
pub fn is_module_name(token: &str) -> bool {
    MODULE_NAME.is_match(token)
}

/// Parses `--print-module-deps` output.
///
/// Only lines consisting entirely of comma-separated module names count;
/// warnings and other prose are skipped.
pub fn parse_print_module_deps(stdout: &str) -> BTreeSet<String> {
    let mut modules = BTreeSet::new();
    for line in stdout.lines().map(str::trim) {
        if line.is_empty() || line.contains(char::is_whitespace) {
            continue;
        }
        let tokens: Vec<&str> = line.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
        if !tokens.is_empty() && tokens.iter().all(|t| is_module_name(t)) {
            modules.extend(tokens.into_iter().map(str::to_string));
        }
    }
    modules
}

/// Parses `--list-deps` output.
///
/// Accepts `java.base`, `java.base/sun.security.util` (module of an internal
/// package) and bracketed `[java.logging]` forms.
pub fn parse_list_deps(stdout: &str) -> BTreeSet<String> {
    let mut modules = BTreeSet::new();
    for line in stdout.lines() {
        let mut entry = line.trim();
        if let (Some(open), Some(close)) = (entry.find('['), entry.find(']')) {
            if open < close {
                entry = entry[open + 1..close].trim();
            }
        }
        let entry = entry.split('/').next().unwrap_or_default();
        let entry = entry.split('@').next().unwrap_or_default();
        if !entry.contains(char::is_whitespace) && is_module_name(entry) {
            modules.insert(entry.to_string());
        }
    }
    modules
}

/// Parses `java --list-modules` output (`java.base@17.0.2` per line).
pub fn parse_list_modules(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(|entry| entry.split('@').next())
        .filter(|name| is_module_name(name))
        .map(str::to_string)
        .collect()
}

/// Whether the analyzer's diagnostics indicate a classic class-path archive.
pub fn has_non_modular_diagnostic(text: &str) -> bool {
    let lower = text.to_lowercase();
    NON_MODULAR_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// What one analyzer run tells the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// The listed modules are the requirement.
    Modules(BTreeSet<String>),
    /// Classic archive: use the default baseline plus whatever was listed.
    Baseline(BTreeSet<String>),
    /// A modular archive listed nothing.
    Empty,
    /// The run failed for a reason not explained by missing module info.
    Failed,
}

/// Interprets one analyzer run.
///
/// | exit | parsed | archive     | result                       |
/// |------|--------|-------------|------------------------------|
/// | 0    | some   | any         | `Modules`                    |
/// | 0    | none   | non-modular | `Baseline`                   |
/// | 0    | none   | modular     | `Empty`                      |
/// | != 0 | any    | non-modular, with diagnostic | `Baseline`  |
/// | != 0 | any    | otherwise   | `Failed`                     |
pub fn interpret(output: &ToolOutput, mode: ListingMode, modular: bool) -> Interpretation {
    let parsed = match mode {
        ListingMode::PrintModuleDeps => parse_print_module_deps(&output.stdout),
        ListingMode::ListDeps => parse_list_deps(&output.stdout),
    };

    if output.success() {
        return match (parsed.is_empty(), modular) {
            (false, _) => Interpretation::Modules(parsed),
            (true, false) => Interpretation::Baseline(parsed),
            (true, true) => Interpretation::Empty,
        };
    }

    if !modular && has_non_modular_diagnostic(&output.combined()) {
        Interpretation::Baseline(parsed)
    } else {
        Interpretation::Failed
    }
}
