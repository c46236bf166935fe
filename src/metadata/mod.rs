//! Metadata read from the input archive itself.
//!
//! Reads the JAR manifest and checks for explicit module information so the
//! pipeline can tell modular archives from classic class-path archives before
//! any external tool runs.

use crate::bundler::{ArchiveKind, Context, Error, ErrorExt, Result};
use std::{
    collections::BTreeMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Facts about an archive relevant to packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMetadata {
    /// JAR or WAR
    pub kind: ArchiveKind,
    /// `Main-Class` manifest attribute
    pub main_class: Option<String>,
    /// `Multi-Release: true` in the manifest
    pub multi_release: bool,
    /// Archive carries a `module-info.class`
    pub modular: bool,
}

/// Opens the archive and extracts its [`ArchiveMetadata`].
///
/// Blocking; async callers go through `spawn_blocking`.
pub fn inspect_archive(path: &Path, kind: ArchiveKind) -> Result<ArchiveMetadata> {
    let file = File::open(path).fs_context("opening archive", path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| Error::InvalidArchive {
        path: path.to_path_buf(),
        reason: format!("not a readable zip archive: {e}"),
    })?;

    let manifest = match archive.by_name(MANIFEST_PATH) {
        Ok(mut entry) => {
            let mut raw = Vec::new();
            entry.read_to_end(&mut raw)?;
            parse_manifest(&String::from_utf8_lossy(&raw))
        }
        Err(zip::result::ZipError::FileNotFound) => BTreeMap::new(),
        Err(e) => return Err(e.into()),
    };

    let modular = archive.file_names().any(|name| is_module_descriptor(name, kind));

    Ok(ArchiveMetadata {
        kind,
        main_class: manifest.get("Main-Class").cloned(),
        multi_release: manifest
            .get("Multi-Release")
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        modular,
    })
}

/// Parses a JAR manifest's main section into attribute pairs.
///
/// Lines starting with a single space continue the previous value. Parsing
/// stops at the first blank line (the start of per-entry sections).
pub fn parse_manifest(content: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    let mut current: Option<(String, String)> = None;

    for line in content.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(continuation);
            }
            continue;
        }
        if let Some((key, value)) = current.take() {
            attributes.insert(key, value);
        }
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            current = Some((key.trim().to_string(), value.trim_start().to_string()));
        }
    }
    if let Some((key, value)) = current {
        attributes.insert(key, value);
    }
    attributes
}

fn is_module_descriptor(name: &str, kind: ArchiveKind) -> bool {
    if name == "module-info.class" {
        return true;
    }
    if let Some(rest) = name.strip_prefix("META-INF/versions/") {
        return rest
            .split_once('/')
            .is_some_and(|(version, file)| {
                version.chars().all(|c| c.is_ascii_digit()) && file == "module-info.class"
            });
    }
    kind == ArchiveKind::War && name == "WEB-INF/classes/module-info.class"
}

/// Extracts a WAR and returns the jdeps targets inside it.
///
/// Targets are `WEB-INF/classes` (if present) followed by every
/// `WEB-INF/lib/*.jar` in sorted order. Blocking.
pub fn extract_war_targets(war: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(war).fs_context("opening archive", war)?;
    let mut archive = zip::ZipArchive::new(file)?;
    std::fs::create_dir_all(destination).fs_context("creating directory", destination)?;
    archive
        .extract(destination)
        .map_err(Error::from)
        .context(format!("extracting {}", war.display()))?;

    let mut targets = Vec::new();
    let classes = destination.join("WEB-INF").join("classes");
    if classes.is_dir() {
        targets.push(classes);
    }

    let lib = destination.join("WEB-INF").join("lib");
    if let Ok(entries) = std::fs::read_dir(&lib) {
        let mut jars: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("jar"))
            })
            .collect();
        jars.sort();
        targets.extend(jars);
    }
    Ok(targets)
}
