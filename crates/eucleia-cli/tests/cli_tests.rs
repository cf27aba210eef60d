//! End-to-end CLI tests
//!
//! Drives the `eucleia` binary against real script files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn eucleia() -> Command {
    Command::cargo_bin("eucleia").expect("binary built")
}

fn write_script(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_prints_output() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        &dir,
        "hello.eu",
        "import <io>\nprint(\"hello\", 1 + 2);\n",
    );

    eucleia()
        .args(["run", &script])
        .assert()
        .success()
        .stdout("hello 3\n");
}

#[test]
fn test_run_program_with_loop_and_function() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        &dir,
        "sum.eu",
        "import <io>\n\
         func sum_to(int n) {\n\
             int total = 0;\n\
             for (int i = 1; i <= n; i = i + 1) {\n\
                 total = total + i;\n\
             }\n\
             return total;\n\
         }\n\
         print(sum_to(4));\n",
    );

    eucleia()
        .args(["run", &script])
        .assert()
        .success()
        .stdout("10\n");
}

#[test]
fn test_run_reports_runtime_error_with_location() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "boom.eu", "int x = 1;\nint y = x / 0;\n");

    eucleia()
        .args(["run", &script])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[EU0008]"))
        .stderr(predicate::str::contains("2:"));
}

#[test]
fn test_run_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "broken.eu", "int x 1;\n");

    eucleia()
        .args(["run", &script])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[EU0001]"));
}

#[test]
fn test_run_json_diagnostics() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "boom.eu", "1 / 0;\n");

    eucleia()
        .args(["run", &script, "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"code\":\"EU0008\""));
}

#[test]
fn test_run_missing_file() {
    eucleia()
        .args(["run", "no-such-file.eu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read source file"));
}

#[test]
fn test_run_resolves_imports_relative_to_script() {
    let dir = TempDir::new().unwrap();
    write_script(&dir, "lib.eu", "func triple(int n) { return n * 3; }\n");
    let script = write_script(
        &dir,
        "main.eu",
        "import <io>\nimport \"lib.eu\"\nprint(triple(7));\n",
    );

    eucleia()
        .args(["run", &script])
        .assert()
        .success()
        .stdout("21\n");
}

// ============================================================================
// ast / tokens
// ============================================================================

#[test]
fn test_ast_dump_is_json() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "prog.eu", "int x = 1;\n");

    eucleia()
        .args(["ast", &script])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"VarDecl\""));
}

#[test]
fn test_ast_pretty_flag() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "prog.eu", "int x = 1;\n");

    eucleia()
        .args(["ast", &script, "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  "));
}

#[test]
fn test_tokens_dump() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "prog.eu", "int x = 1;\n");

    eucleia()
        .args(["tokens", &script])
        .assert()
        .success()
        .stdout(predicate::str::contains("Identifier"))
        .stdout(predicate::str::contains("Semicolon"))
        .stdout(predicate::str::contains("Eof"));
}

// ============================================================================
// general
// ============================================================================

#[test]
fn test_help() {
    eucleia()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("ast"))
        .stdout(predicate::str::contains("tokens"));
}

#[test]
fn test_version() {
    eucleia()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_run_alias() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "prog.eu", "int x = 1;\n");

    eucleia().args(["r", &script]).assert().success();
}
