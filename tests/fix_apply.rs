//! Integration tests for `argnote fix` and `argnote annotate`.
//!
//! Both commands preview a diff by default; `--apply` rewrites the file.

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;

mod util;
use util::{THREE_INTS, argnote_in, java_project};

const FIXED: &str = "f(/* a= */ 1, /* b= */ 2, /* c= */ 3);";

// Test: preview prints a unified diff and leaves the file alone.
#[test]
fn fix_preview_does_not_write()
{
    let tmp = java_project(&[("T.java", THREE_INTS)]);

    argnote_in(tmp.path())
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("-        f(1, 2, 3);"))
        .stdout(predicate::str::contains(format!("+        {FIXED}")))
        .stdout(predicate::str::contains("Would apply 3 fix(es) in 1 file(s)"));

    tmp.child("T.java").assert(THREE_INTS);
}

// Test: --apply annotates every literal in place.
#[test]
fn fix_apply_rewrites_file()
{
    let tmp = java_project(&[("T.java", THREE_INTS)]);

    argnote_in(tmp.path())
        .args(["fix", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 3 fix(es) in 1 file(s)"));

    tmp.child("T.java")
        .assert(predicate::str::contains(FIXED));

    // A second pass has nothing left to do
    argnote_in(tmp.path())
        .args(["--quiet", "check", "--fail-on-findings"])
        .assert()
        .success();
}

// Test: untouched files are not listed or rewritten.
#[test]
fn fix_skips_clean_files()
{
    let clean = "class C {\n    void f(int a, int b) {}\n    void g(int v) { f(v, v); }\n}\n";
    let tmp = java_project(&[("T.java", THREE_INTS), ("C.java", clean)]);

    argnote_in(tmp.path())
        .args(["fix", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 3 fix(es) in 1 file(s)"));

    tmp.child("C.java").assert(clean);
}

// Test: the cursor intention annotates just the argument under it.
#[test]
fn annotate_applies_at_cursor()
{
    let tmp = java_project(&[("T.java", THREE_INTS)]);

    // Line 4 is `        f(1, 2, 3);`; column 14 is the `2`
    argnote_in(tmp.path())
        .args(["annotate", "T.java:4:14", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Annotated argument 1 of T.f(a, b, c) with `b`"));

    tmp.child("T.java")
        .assert(predicate::str::contains("f(1, /* b= */ 2, 3);"));
}

// Test: annotate works on non-literal arguments too.
#[test]
fn annotate_accepts_any_argument()
{
    let src = "class T {\n    void f(int a, int b) {}\n    void g(int v) {\n        f(v, v);\n    }\n}\n";
    let tmp = java_project(&[("T.java", src)]);

    argnote_in(tmp.path())
        .args(["--quiet", "annotate", "T.java:4:11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+        f(/* a= */ v, v);"));

    // Preview only
    tmp.child("T.java").assert(src);
}

// Test: a cursor off any argument is a diagnostic with exit status 2.
#[test]
fn annotate_off_argument_is_unavailable()
{
    let tmp = java_project(&[("T.java", THREE_INTS)]);

    argnote_in(tmp.path())
        .args(["annotate", "T.java:1:1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no annotation available"));

    argnote_in(tmp.path())
        .args(["annotate", "T.java:40:1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("outside the file"));

    tmp.child("T.java").assert(THREE_INTS);
}

// Test: a malformed position is rejected before any file is read.
#[test]
fn annotate_rejects_bad_position()
{
    let tmp = java_project(&[("T.java", THREE_INTS)]);

    argnote_in(tmp.path())
        .args(["annotate", "T.java:four"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected File.java:LINE:COL"));
}
