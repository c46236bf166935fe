//! CLI integration tests using the real jarpack binary

mod common;

use assert_cmd::Command;
use common::{FakeJdk, entry_count, write_jar};
use predicates::prelude::*;
use std::fs;

#[allow(deprecated)]
fn jarpack_cmd(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("jarpack").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_output() {
    let dir = tempfile::tempdir().unwrap();
    jarpack_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("package"))
        .stdout(predicate::str::contains("modules"))
        .stdout(predicate::str::contains("Exit codes"));
}

#[test]
fn test_missing_archive_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    jarpack_cmd(dir.path())
        .args(["package", "missing.jar", "--platform", "linux"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("missing.jar"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_unsupported_platform_is_rejected_by_the_parser() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(&dir.path().join("app.jar"), Some("com.example.Main"));
    jarpack_cmd(dir.path())
        .args(["package", "app.jar", "--platform", "macos"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("macos"));
}

#[test]
fn test_bad_jdk_override_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(&dir.path().join("app.jar"), Some("com.example.Main"));
    let work = dir.path().join("work");
    fs::create_dir(&work).unwrap();

    jarpack_cmd(dir.path())
        .args(["package", "app.jar", "--platform", "linux", "--jdk", "no-such-jdk"])
        .arg("--work-dir")
        .arg(&work)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no-such-jdk"));

    assert!(!dir.path().join("dist").exists());
    assert_eq!(entry_count(&work), 0);
}

#[test]
fn test_invalid_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("jarpack.toml"), "no_such_key = 1\n").unwrap();
    jarpack_cmd(dir.path())
        .args(["jdk", "--jdk", "anything"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("jarpack.toml"));
}

#[cfg(unix)]
#[test]
fn test_jdk_command_reports_the_override() {
    let dir = tempfile::tempdir().unwrap();
    let jdk = FakeJdk::create(dir.path());
    jarpack_cmd(dir.path())
        .args(["jdk", "--jdk"])
        .arg(&jdk.home)
        .assert()
        .success()
        .stdout(predicate::str::contains("Version: 17"))
        .stdout(predicate::str::contains("jlink"));
}

#[cfg(unix)]
#[test]
fn test_modules_command_prints_one_module_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let jdk = FakeJdk::create(dir.path());
    jdk.set_jdeps_output("java.base,java.xml\n");
    write_jar(&dir.path().join("app.jar"), Some("com.example.Main"));
    let work = dir.path().join("work");
    fs::create_dir(&work).unwrap();

    jarpack_cmd(dir.path())
        .args(["--quiet", "modules", "app.jar", "--modules", "java.sql", "--jdk"])
        .arg(&jdk.home)
        .arg("--work-dir")
        .arg(&work)
        .assert()
        .success()
        .stdout("java.base\njava.sql\njava.xml\n");

    assert_eq!(entry_count(&work), 0);
}

#[cfg(unix)]
#[test]
fn test_package_writes_artifact_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let jdk = FakeJdk::create(dir.path());
    write_jar(&dir.path().join("app.jar"), Some("com.example.Main"));
    let work = dir.path().join("work");
    fs::create_dir(&work).unwrap();

    jarpack_cmd(dir.path())
        .args([
            "package",
            "app.jar",
            "--platform",
            "linux",
            "--packager",
            "shell",
            "--name",
            "hello",
            "--report",
            "report.json",
            "--jdk",
        ])
        .arg(&jdk.home)
        .arg("--work-dir")
        .arg(&work)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let artifact = dir.path().join("dist").join("hello");
    assert!(artifact.is_file());
    assert_eq!(entry_count(&dir.path().join("dist")), 1);
    assert_eq!(entry_count(&work), 0);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(report["modules"], serde_json::json!(["java.base"]));
    assert_eq!(report["module_source"], "analyzed");
    assert_eq!(report["jdk_version"], 17);
    assert_eq!(report["packager"], "shell");
    assert_eq!(report["size"], fs::metadata(&artifact).unwrap().len());
}

#[cfg(unix)]
#[test]
fn test_sigterm_during_image_build_cleans_up() {
    use std::{
        process::{Command as StdCommand, Stdio},
        time::{Duration, Instant},
    };
    use wait_timeout::ChildExt;

    let dir = tempfile::tempdir().unwrap();
    let jdk = FakeJdk::create(dir.path());
    jdk.replace_tool(
        "jlink",
        "#!/bin/sh\nHOME_DIR=\"$(cd \"$(dirname \"$0\")/..\" && pwd)\"\ntouch \"$HOME_DIR/jlink-started\"\nexec sleep 30\n",
    );
    write_jar(&dir.path().join("app.jar"), Some("com.example.Main"));
    let work = dir.path().join("work");
    fs::create_dir(&work).unwrap();

    let mut child = StdCommand::new(env!("CARGO_BIN_EXE_jarpack"))
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .args(["package", "app.jar", "--platform", "linux", "--packager", "shell", "--jdk"])
        .arg(&jdk.home)
        .arg("--work-dir")
        .arg(&work)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let marker = jdk.home.join("jlink-started");
    let deadline = Instant::now() + Duration::from_secs(20);
    while !marker.exists() {
        assert!(Instant::now() < deadline, "jlink never started");
        std::thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(entry_count(&work), 1);

    let status = StdCommand::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let status = match child.wait_timeout(Duration::from_secs(10)).unwrap() {
        Some(status) => status,
        None => {
            child.kill().unwrap();
            panic!("jarpack ignored SIGTERM");
        }
    };
    assert_eq!(status.code(), Some(130));
    assert_eq!(entry_count(&work), 0);
    assert!(!dir.path().join("dist").exists());
}
