//! End-to-end pipeline tests against a scripted JDK.
#![cfg(unix)]

mod common;

use common::{FakeJdk, entry_count, write_jar, write_modular_jar, write_war};
use jarpack::bundler::{
    Bundler, Error, PackagerKind, PackagingRequest, RequestBuilder, Result, TargetPlatform,
    Timeouts,
    assembler::{LauncherFlavor, PackageInput, Packager, packager::BoxFuture},
    modules::ResolutionSource,
    toolchain::JdkLocator,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Notify;

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
    jdk: FakeJdk,
    work: PathBuf,
    dist: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let jdk = FakeJdk::create(&root);
        let work = root.join("work");
        std::fs::create_dir(&work).unwrap();
        Self {
            _dir: dir,
            jdk,
            work,
            dist: root.join("dist"),
            root,
        }
    }

    fn jar(&self, name: &str) -> PathBuf {
        let path = self.root.join(name);
        write_jar(&path, Some("com.example.Main"));
        path
    }

    fn builder(&self, archive: &Path) -> RequestBuilder {
        RequestBuilder::new()
            .archive(archive)
            .target_platform(TargetPlatform::Linux)
            .packager(PackagerKind::Shell)
            .jdk_override(&self.jdk.home)
            .work_dir(&self.work)
            .output_dir(&self.dist)
    }
}

fn bundler(request: PackagingRequest) -> Bundler {
    Bundler::new(request).with_locator(JdkLocator::with_probes(Vec::new()))
}

#[tokio::test]
async fn jar_becomes_one_runnable_executable() {
    let ws = Workspace::new();
    let jar = ws.jar("app.jar");
    let request = ws
        .builder(&jar)
        .output_name("hello")
        .jvm_args(["-Xmx64m"])
        .build()
        .unwrap();

    let artifact = bundler(request).bundle().await.unwrap();

    assert_eq!(artifact.path, ws.dist.join("hello"));
    assert_eq!(entry_count(&ws.dist), 1);
    assert_eq!(entry_count(&ws.work), 0);
    assert_eq!(artifact.modules.to_arg(), "java.base");
    assert_eq!(artifact.module_source, ResolutionSource::Analyzed);
    assert_eq!(artifact.sha256.len(), 64);

    let cache = tempfile::tempdir().unwrap();
    let output = std::process::Command::new(&artifact.path)
        .arg("world")
        .env("JARPACK_CACHE", cache.path())
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(42), "stdout: {stdout}");
    assert!(stdout.contains("launched: -Xmx64m -jar "), "stdout: {stdout}");
    assert!(stdout.trim_end().ends_with("app.jar world"), "stdout: {stdout}");
}

#[tokio::test]
async fn war_modules_merge_analyzer_output_with_extras() {
    let ws = Workspace::new();
    ws.jdk.set_jdeps_output("java.base,java.xml\n");
    let war = ws.root.join("shop.war");
    write_war(&war, Some("com.example.Server"));
    let request = ws
        .builder(&war)
        .extra_modules(["java.sql"])
        .build()
        .unwrap();

    let artifact = bundler(request).bundle().await.unwrap();

    assert_eq!(artifact.modules.to_arg(), "java.base,java.sql,java.xml");
    let calls = ws.jdk.jdeps_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("--print-module-deps "));
    assert!(calls[0].contains("WEB-INF/classes"));
    assert_eq!(entry_count(&ws.work), 0);
}

#[tokio::test]
async fn classic_jar_without_listing_gets_a_stable_baseline() {
    let ws = Workspace::new();
    ws.jdk.set_jdeps_output("");
    let jar = ws.jar("plain.jar");

    let first = bundler(ws.builder(&jar).build().unwrap())
        .resolve_modules_until(std::future::pending())
        .await
        .unwrap()
        .1;
    let second = bundler(ws.builder(&jar).build().unwrap())
        .resolve_modules_until(std::future::pending())
        .await
        .unwrap()
        .1;

    assert_eq!(first, second);
    assert_eq!(first.source, ResolutionSource::Baseline);
    assert_eq!(
        first.modules.to_arg(),
        "java.base,java.instrument,java.logging"
    );
    assert_eq!(entry_count(&ws.work), 0);
}

#[tokio::test]
async fn concurrent_runs_do_not_interfere() {
    let ws = Workspace::new();
    let jar = ws.jar("app.jar");
    let first = bundler(ws.builder(&jar).output_name("one").build().unwrap());
    let second = bundler(ws.builder(&jar).output_name("two").build().unwrap());

    let (a, b) = tokio::join!(first.bundle(), second.bundle());

    assert_eq!(a.unwrap().path, ws.dist.join("one"));
    assert_eq!(b.unwrap().path, ws.dist.join("two"));
    assert_eq!(entry_count(&ws.dist), 2);
    assert_eq!(entry_count(&ws.work), 0);
}

#[tokio::test]
async fn failing_image_build_leaves_nothing_behind() {
    let ws = Workspace::new();
    ws.jdk.replace_tool(
        "jlink",
        "#!/bin/sh\necho 'Error: Module java.base not found' >&2\nexit 1\n",
    );
    let jar = ws.jar("app.jar");

    let err = bundler(ws.builder(&jar).build().unwrap())
        .bundle()
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 5);
    assert!(err.to_string().contains("Module java.base not found"));
    assert!(!ws.dist.exists());
    assert_eq!(entry_count(&ws.work), 0);
}

#[tokio::test]
async fn list_deps_fallback_runs_after_a_failed_first_listing() {
    let ws = Workspace::new();
    ws.jdk.replace_tool(
        "jdeps",
        r#"#!/bin/sh
HOME_DIR="$(cd "$(dirname "$0")/.." && pwd)"
echo "$*" >> "$HOME_DIR/jdeps-calls"
if [ "$1" = "--print-module-deps" ]; then
    echo "Error: unknown option: --print-module-deps" >&2
    exit 2
fi
printf '   java.base\n   java.sql/sun.sql\n'
"#,
    );
    let jar = ws.jar("app.jar");

    let (_, resolution) = bundler(ws.builder(&jar).build().unwrap())
        .resolve_modules_until(std::future::pending())
        .await
        .unwrap();

    let calls = ws.jdk.jdeps_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].starts_with("--print-module-deps "));
    assert!(calls[1].starts_with("--list-deps "));
    assert_eq!(resolution.modules.to_arg(), "java.base,java.sql");
    assert_eq!(resolution.source, ResolutionSource::Analyzed);
    assert_eq!(entry_count(&ws.work), 0);
}

#[tokio::test]
async fn modular_archive_with_empty_listing_is_refused() {
    let ws = Workspace::new();
    ws.jdk.set_jdeps_output("");
    let jar = ws.root.join("modular.jar");
    write_modular_jar(&jar, Some("com.example.Main"));

    let err = bundler(ws.builder(&jar).build().unwrap())
        .bundle()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EmptyDependencySet { .. }), "{err}");
    assert_eq!(err.exit_code(), 4);
    assert!(!ws.dist.exists());
    assert_eq!(entry_count(&ws.work), 0);
}

const HANGING_JDEPS: &str = r#"#!/bin/sh
HOME_DIR="$(cd "$(dirname "$0")/.." && pwd)"
echo "$*" >> "$HOME_DIR/jdeps-calls"
exec sleep 30
"#;

const HANGING_JLINK: &str = r#"#!/bin/sh
HOME_DIR="$(cd "$(dirname "$0")/.." && pwd)"
echo started >> "$HOME_DIR/jlink-calls"
exec sleep 30
"#;

fn short_timeouts() -> Timeouts {
    Timeouts {
        analysis: Duration::from_millis(300),
        image: Duration::from_millis(300),
        ..Timeouts::default()
    }
}

#[tokio::test]
async fn hung_analyzer_is_retried_once_then_fails() {
    let ws = Workspace::new();
    ws.jdk.replace_tool("jdeps", HANGING_JDEPS);
    let jar = ws.jar("app.jar");
    let request = ws.builder(&jar).timeouts(short_timeouts()).build().unwrap();

    let started = Instant::now();
    let err = bundler(request).bundle().await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(matches!(err, Error::DependencyAnalysisFailed { .. }), "{err}");
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("timed out"), "{err}");
    let calls = ws.jdk.jdeps_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.starts_with("--print-module-deps ")));
    assert!(!ws.dist.exists());
    assert_eq!(entry_count(&ws.work), 0);
}

#[tokio::test]
async fn hung_image_build_is_retried_once_then_fails() {
    let ws = Workspace::new();
    ws.jdk.replace_tool("jlink", HANGING_JLINK);
    let jar = ws.jar("app.jar");
    let request = ws.builder(&jar).timeouts(short_timeouts()).build().unwrap();

    let err = bundler(request).bundle().await.unwrap_err();

    assert!(matches!(err, Error::ImageBuildFailed { .. }), "{err}");
    assert_eq!(err.exit_code(), 5);
    let starts = std::fs::read_to_string(ws.jdk.home.join("jlink-calls")).unwrap();
    assert_eq!(starts.lines().count(), 2);
    assert!(!ws.dist.exists());
    assert_eq!(entry_count(&ws.work), 0);
}

/// Signals once packaging has started, then never finishes.
struct StallingPackager {
    started: Arc<Notify>,
}

impl Packager for StallingPackager {
    fn name(&self) -> &str {
        "stalling"
    }

    fn launcher_flavor(&self) -> LauncherFlavor {
        LauncherFlavor::Posix
    }

    fn package<'a>(&'a self, input: PackageInput<'a>) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            tokio::fs::write(input.layout.build_dir().join("partial"), b"half")
                .await
                .unwrap();
            self.started.notify_one();
            std::future::pending::<Result<PathBuf>>().await
        })
    }
}

#[tokio::test]
async fn interrupt_during_packaging_cleans_up() {
    let ws = Workspace::new();
    let jar = ws.jar("app.jar");
    let started = Arc::new(Notify::new());
    let bundler = bundler(ws.builder(&jar).build().unwrap()).with_packager(Box::new(
        StallingPackager {
            started: Arc::clone(&started),
        },
    ));

    let err = bundler
        .bundle_until(async move { started.notified().await })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Interrupted));
    assert_eq!(err.exit_code(), 130);
    assert_eq!(entry_count(&ws.dist), 0);
    assert_eq!(entry_count(&ws.work), 0);
}
