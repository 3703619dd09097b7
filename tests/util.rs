//! Shared test utilities for integration tests
//!
//! Builds throwaway Java projects and runs the binary inside them.

#![allow(dead_code)]

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use std::process::Command;

/// A method with three int parameters and one call passing bare literals.
pub const THREE_INTS: &str = "class T {\n    void f(int a, int b, int c) {}\n    void g() {\n        f(1, 2, 3);\n    }\n}\n";

/// Write `files` (relative path, contents) into a fresh temp directory.
pub fn java_project(files: &[(&str, &str)]) -> assert_fs::TempDir
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    for (path, text) in files
    {
        tmp.child(path)
            .write_str(text)
            .expect("write source");
    }

    tmp
}

/// `argnote` with colours off and the working directory at `dir`.
///
/// The settings store is pinned inside `dir` so tests never touch the
/// developer's own template.
pub fn argnote_in(dir: &std::path::Path) -> Command
{
    let mut cmd = Command::cargo_bin("argnote").expect("argnote binary");
    cmd.current_dir(dir)
        .env_remove("ARGNOTE_LOG")
        .args(["--no-color", "--settings"])
        .arg(dir.join("settings.toml"));
    cmd
}
