//! Built-in self-extracting shell packager.
//!
//! The artifact is a POSIX `sh` stub followed by a gzipped tar of the bundle
//! directory. Needs nothing beyond `sh`, `tail` and `tar` on the target.

use super::{BoxFuture, PackageInput, Packager};
use crate::bundler::{
    Error, Result, TargetPlatform,
    assembler::{
        launcher::{LauncherFlavor, sh_quote},
        templates::SELF_EXTRACTING_STUB,
    },
    builder::checksum::sha256_hex,
    utils::fs::write_executable,
};
use flate2::{Compression, write::GzEncoder};
use handlebars::Handlebars;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Self-extracting `sh` artifact builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellPackager;

impl ShellPackager {
    /// Only Linux artifacts can be built this way.
    pub fn check_target(platform: TargetPlatform) -> Result<()> {
        match platform {
            TargetPlatform::Linux => Ok(()),
            other => Err(Error::PackagingFailed {
                reason: format!("the shell packager cannot build {other} artifacts"),
                output: String::new(),
            }),
        }
    }
}

impl Packager for ShellPackager {
    fn name(&self) -> &str {
        "shell"
    }

    fn launcher_flavor(&self) -> LauncherFlavor {
        LauncherFlavor::Posix
    }

    fn package<'a>(&'a self, input: PackageInput<'a>) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            let request = input.request;
            let layout = input.layout;

            let bundle = layout.bundle_dir().to_path_buf();
            let payload = tokio::task::spawn_blocking(move || build_payload(&bundle))
                .await
                .map_err(|e| packaging_error(format!("payload task panicked: {e}")))??;

            let hash = sha256_hex(&payload);
            let launcher = layout
                .launcher_stub()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| LauncherFlavor::Posix.file_name().to_string());
            let stub = render_stub(request.output_name(), &launcher, payload.len(), &hash[..16])?;

            let output = layout
                .build_dir()
                .join(request.target_platform().artifact_file_name(request.output_name()));
            let mut content = stub.into_bytes();
            content.extend_from_slice(&payload);
            write_executable(&output, &content).await?;

            log::debug!(
                "Self-extracting artifact: {} byte stub, {} byte payload",
                content.len() - payload.len(),
                payload.len()
            );
            Ok(output)
        })
    }
}

/// Gzipped tar of `bundle`, with normalised metadata so identical bundles
/// produce identical payloads.
pub fn build_payload(bundle: &Path) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut archive = tar::Builder::new(encoder);
    archive.mode(tar::HeaderMode::Deterministic);
    archive.follow_symlinks(false);
    archive
        .append_dir_all(".", bundle)
        .map_err(|e| packaging_error(format!("archiving {}: {e}", bundle.display())))?;
    let encoder = archive
        .into_inner()
        .map_err(|e| packaging_error(format!("finishing payload: {e}")))?;
    encoder
        .finish()
        .map_err(|e| packaging_error(format!("compressing payload: {e}")))
}

/// Renders the extraction stub for a payload of `payload_size` bytes.
pub fn render_stub(name: &str, launcher: &str, payload_size: usize, payload_hash: &str) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_template_string("stub", SELF_EXTRACTING_STUB)?;

    let mut data = BTreeMap::new();
    data.insert("name", sh_quote(name));
    data.insert("launcher", launcher.to_string());
    data.insert("payload_size", payload_size.to_string());
    data.insert("payload_hash", payload_hash.to_string());
    Ok(handlebars.render("stub", &data)?)
}

fn packaging_error(reason: String) -> Error {
    Error::PackagingFailed {
        reason,
        output: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    #[test]
    fn payload_keeps_tree_and_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("runtime/bin")).unwrap();
        std::fs::write(dir.path().join("runtime/bin/java"), "#!/bin/sh\n").unwrap();
        std::fs::write(dir.path().join("app.jar"), "PK").unwrap();

        let first = build_payload(dir.path()).unwrap();
        let second = build_payload(dir.path()).unwrap();
        assert_eq!(sha256_hex(&first), sha256_hex(&second));

        let mut archive = tar::Archive::new(GzDecoder::new(first.as_slice()));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.ends_with("runtime/bin/java")));
        assert!(names.iter().any(|n| n.ends_with("app.jar")));
    }

    #[test]
    fn stub_embeds_size_hash_and_launcher() {
        let stub = render_stub("app", "launcher.sh", 1234, "0123456789abcdef").unwrap();
        assert!(stub.starts_with("#!/bin/sh\n"));
        assert!(stub.contains("PAYLOAD_SIZE=1234\n"));
        assert!(stub.contains(r#"DIR="$CACHE"/'app'"-0123456789abcdef""#));
        assert!(stub.contains(r#"exec "$DIR/launcher.sh" "$@""#));
        assert!(stub.ends_with("exit 1\n"));
    }

    #[cfg(unix)]
    #[test]
    fn hostile_name_is_data_not_code() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("bundle");
        std::fs::create_dir(&bundle).unwrap();
        let launcher = bundle.join("launcher.sh");
        std::fs::write(&launcher, "#!/bin/sh\necho started\n").unwrap();
        std::fs::set_permissions(&launcher, std::fs::Permissions::from_mode(0o755)).unwrap();

        let name = "x$(touch PWNED)\"`touch PWNED`";
        let payload = build_payload(&bundle).unwrap();
        let stub = render_stub(name, "launcher.sh", payload.len(), "0123456789abcdef").unwrap();
        let artifact = dir.path().join("artifact");
        let mut content = stub.into_bytes();
        content.extend_from_slice(&payload);
        std::fs::write(&artifact, content).unwrap();
        std::fs::set_permissions(&artifact, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cache = dir.path().join("cache");
        let output = std::process::Command::new(&artifact)
            .current_dir(dir.path())
            .env("JARPACK_CACHE", &cache)
            .output()
            .unwrap();

        assert!(output.status.success(), "{output:?}");
        assert_eq!(String::from_utf8_lossy(&output.stdout), "started\n");
        assert!(!dir.path().join("PWNED").exists());
        assert!(cache.join(format!("{name}-0123456789abcdef")).is_dir());
    }

    #[test]
    fn windows_targets_are_refused() {
        assert!(ShellPackager::check_target(TargetPlatform::Linux).is_ok());
        assert!(ShellPackager::check_target(TargetPlatform::Windows).is_err());
    }
}
