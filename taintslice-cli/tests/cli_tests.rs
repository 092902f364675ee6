//! Black-box tests against the compiled binary.

use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

fn taintslice() -> Command {
    Command::new(env!("CARGO_BIN_EXE_taintslice"))
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

#[test]
fn help_lists_subcommands() {
    taintslice()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("slice"))
        .stdout(predicate::str::contains("extract"));
}

#[test]
fn version_flag_works() {
    taintslice()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("taintslice"));
}

#[test]
fn slice_help_shows_required_options() {
    taintslice()
        .args(["slice", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--src"))
        .stdout(predicate::str::contains("--file"))
        .stdout(predicate::str::contains("--line"));
}

#[test]
fn zero_line_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.php", "<?php\n");

    taintslice()
        .args(["slice", "--file", "a.php", "--line", "0"])
        .arg("--src")
        .arg(dir.path())
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--line"));
}

#[test]
fn missing_target_exits_with_analysis_error() {
    let dir = tempfile::tempdir().unwrap();

    taintslice()
        .args(["slice", "--file", "missing.php", "--line", "1"])
        .arg("--src")
        .arg(dir.path())
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing.php"));
}

#[test]
fn slice_end_to_end_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.php",
        "<?php\nfunction foo($cmd) {\n    $x = $_GET['cmd'];\n    return $x;\n}\n",
    );
    write(dir.path(), "b.php", "<?php\ninclude 'a.php';\nexec($cmd);\n");
    write(
        dir.path(),
        "config.yaml",
        r#"
sources:
  user_input:
    - pattern: '\$_GET'
      enabled: true
sinks:
  command_execution:
    - pattern: 'exec\s*\('
      enabled: true
"#,
    );
    let output = dir.path().join("report.json");

    taintslice()
        .args(["slice", "--file", "a.php", "--line", "3"])
        .arg("--src")
        .arg(dir.path())
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .arg("--output")
        .arg(&output)
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("function 'foo'"));

    let report = std::fs::read_to_string(&output).unwrap();
    assert!(report.contains("include_dependency"));
    assert!(report.contains("cross_file_taint_paths"));

    taintslice()
        .arg("extract")
        .arg("--result")
        .arg(&output)
        .arg("--src")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(">>> "))
        .stdout(predicate::str::contains("Cross-file taint paths"));
}
