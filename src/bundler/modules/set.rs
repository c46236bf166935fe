//! The resolved set of platform modules.

use std::{collections::BTreeSet, fmt};

/// Modules included for classic class-path archives whose requirements
/// cannot be determined.
pub const DEFAULT_BASELINE: [&str; 3] = ["java.base", "java.instrument", "java.logging"];

/// Non-empty set of module names handed to the runtime image builder.
///
/// Order is irrelevant; iteration is sorted so command lines are stable.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ModuleSet(BTreeSet<String>);

impl ModuleSet {
    /// Merges detected and extra modules. `None` when the union is empty.
    pub fn merge<I, S>(detected: I, extra: &BTreeSet<String>) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut modules: BTreeSet<String> = detected
            .into_iter()
            .map(Into::into)
            .map(|m: String| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        modules.extend(extra.iter().cloned());
        (!modules.is_empty()).then_some(Self(modules))
    }

    /// The default baseline merged with `detected` and `extra`.
    pub fn baseline<I, S>(detected: I, extra: &BTreeSet<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let detected = detected
            .into_iter()
            .map(Into::into)
            .chain(DEFAULT_BASELINE.iter().map(|m| m.to_string()));
        Self::merge(detected, extra).unwrap_or_else(|| {
            Self(DEFAULT_BASELINE.iter().map(|m| m.to_string()).collect())
        })
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a set built by `merge` or `baseline`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `module` is included.
    pub fn contains(&self, module: &str) -> bool {
        self.0.contains(module)
    }

    /// Module names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma-separated list as accepted by `jlink --add-modules`.
    pub fn to_arg(&self) -> String {
        self.iter().collect::<Vec<_>>().join(",")
    }
}

impl fmt::Display for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iter().collect::<Vec<_>>().join(", "))
    }
}
