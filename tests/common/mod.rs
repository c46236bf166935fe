//! Shared fixtures: a scripted stand-in JDK and archive builders.
#![allow(dead_code)]

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use zip::write::SimpleFileOptions;

const FAKE_JDEPS: &str = r#"#!/bin/sh
HOME_DIR="$(cd "$(dirname "$0")/.." && pwd)"
echo "$*" >> "$HOME_DIR/jdeps-calls"
cat "$HOME_DIR/jdeps-output"
"#;

const FAKE_JLINK: &str = r#"#!/bin/sh
OUT=""
MODS=""
while [ $# -gt 0 ]; do
    case "$1" in
        --output) OUT="$2"; shift 2 ;;
        --add-modules) MODS="$2"; shift 2 ;;
        *) shift ;;
    esac
done
mkdir -p "$OUT/bin"
printf '#!/bin/sh\necho "launched: $*"\nexit 42\n' > "$OUT/bin/java"
chmod 755 "$OUT/bin/java"
printf 'MODULES="%s"\n' "$MODS" > "$OUT/release"
"#;

const FAKE_JAVA: &str = r#"#!/bin/sh
if [ "$1" = "--list-modules" ]; then
    echo "java.base@17.0.2"
    echo "java.logging@17.0.2"
    echo "java.sql@17.0.2"
    exit 0
fi
echo 'openjdk version "17.0.2"' >&2
"#;

/// A directory laid out like a JDK 17 whose tools are shell scripts.
///
/// `jdeps` prints the contents of `<home>/jdeps-output` and appends its
/// arguments to `<home>/jdeps-calls`. `jlink` writes an image whose `java`
/// prints its arguments and exits with 42.
pub struct FakeJdk {
    pub home: PathBuf,
}

impl FakeJdk {
    pub fn create(parent: &Path) -> Self {
        let home = parent.join("jdk-17");
        let bin = home.join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(home.join("release"), "JAVA_VERSION=\"17.0.2\"\n").unwrap();
        write_script(&bin.join("jdeps"), FAKE_JDEPS);
        write_script(&bin.join("jlink"), FAKE_JLINK);
        write_script(&bin.join("java"), FAKE_JAVA);
        let jdk = Self { home };
        jdk.set_jdeps_output("java.base\n");
        jdk
    }

    /// Replaces what jdeps prints.
    pub fn set_jdeps_output(&self, output: &str) {
        fs::write(self.home.join("jdeps-output"), output).unwrap();
    }

    /// Swaps `bin/<name>` for a script with `body`.
    pub fn replace_tool(&self, name: &str, body: &str) {
        write_script(&self.home.join("bin").join(name), body);
    }

    /// Argument lines of every jdeps call so far.
    pub fn jdeps_calls(&self) -> Vec<String> {
        fs::read_to_string(self.home.join("jdeps-calls"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

fn manifest(main_class: Option<&str>) -> Vec<u8> {
    let mut manifest = String::from("Manifest-Version: 1.0\r\n");
    if let Some(class) = main_class {
        manifest.push_str(&format!("Main-Class: {class}\r\n"));
    }
    manifest.push_str("\r\n");
    manifest.into_bytes()
}

/// Writes a classic (non-modular) JAR.
pub fn write_jar(path: &Path, main_class: Option<&str>) {
    let manifest = manifest(main_class);
    write_zip(
        path,
        &[
            ("META-INF/MANIFEST.MF", &manifest),
            ("com/example/Main.class", b"\xca\xfe\xba\xbe"),
        ],
    );
}

/// Writes a JAR that declares a module (`module-info.class` at its root).
pub fn write_modular_jar(path: &Path, main_class: Option<&str>) {
    let manifest = manifest(main_class);
    write_zip(
        path,
        &[
            ("META-INF/MANIFEST.MF", &manifest),
            ("module-info.class", b"\xca\xfe\xba\xbe"),
            ("com/example/Main.class", b"\xca\xfe\xba\xbe"),
        ],
    );
}

/// Writes a WAR with compiled classes under `WEB-INF/classes`.
pub fn write_war(path: &Path, main_class: Option<&str>) {
    let manifest = manifest(main_class);
    write_zip(
        path,
        &[
            ("META-INF/MANIFEST.MF", &manifest),
            ("WEB-INF/web.xml", b"<web-app/>"),
            ("WEB-INF/classes/com/example/App.class", b"\xca\xfe\xba\xbe"),
        ],
    );
}

/// Number of entries directly inside `dir` (0 when it does not exist).
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
