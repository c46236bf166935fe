//! Handlebars templates for generated launchers.

/// POSIX launcher placed next to the runtime and archive.
///
/// `name` and `words` are pre-quoted shell words; bundled paths are
/// expanded against the directory the launcher lives in.
pub const POSIX_LAUNCHER: &str = r#"#!/bin/sh
BASE="$(cd "$(dirname "$0")" && pwd)"
JAVA="$BASE/{{runtime_dir}}/bin/{{java}}"
if [ ! -x "$JAVA" ]; then
    echo {{name}}": embedded runtime not found at $JAVA" >&2
    exit 127
fi
exec "$JAVA"{{#each words}} {{this}}{{/each}} "$@"
"#;

/// Python launcher frozen by PyInstaller.
///
/// `name` and `words` are Python expressions; `sys._MEIPASS` is the
/// extraction directory when frozen.
pub const PYTHON_LAUNCHER: &str = r#"#!/usr/bin/env python3
import subprocess
import sys
from pathlib import Path

base = Path(getattr(sys, "_MEIPASS", Path(__file__).resolve().parent))
java = base / "{{runtime_dir}}" / "bin" / "{{java}}"
if not java.exists():
    sys.stderr.write({{name}} + ": embedded runtime not found at %s\n" % java)
    sys.exit(127)

argv = [str(java){{#each words}}, {{this}}{{/each}}] + sys.argv[1:]
sys.exit(subprocess.call(argv))
"#;

/// Self-extracting stub prepended to a gzipped tar payload.
///
/// The payload is the last `payload_size` bytes of the file. It is unpacked
/// once per payload hash into the cache directory; the stub then `exec`s the
/// bundled launcher so the application's exit status becomes ours. `name`
/// arrives shell-quoted.
pub const SELF_EXTRACTING_STUB: &str = r#"#!/bin/sh
set -e
PAYLOAD_SIZE={{payload_size}}
if [ -n "$JARPACK_CACHE" ]; then
    CACHE="$JARPACK_CACHE"
elif [ -n "$XDG_CACHE_HOME" ]; then
    CACHE="$XDG_CACHE_HOME/jarpack"
else
    CACHE="$HOME/.cache/jarpack"
fi
DIR="$CACHE"/{{name}}"-{{payload_hash}}"
if [ ! -f "$DIR/.complete" ]; then
    mkdir -p "$CACHE"
    TMP="$DIR.$$.tmp"
    rm -rf "$TMP"
    mkdir -p "$TMP"
    tail -c "$PAYLOAD_SIZE" "$0" | tar -xzf - -C "$TMP"
    : > "$TMP/.complete"
    if [ -f "$DIR/.complete" ]; then
        rm -rf "$TMP"
    else
        rm -rf "$DIR"
        mv "$TMP" "$DIR"
    fi
fi
exec "$DIR/{{launcher}}" "$@"
exit 1
"#;
