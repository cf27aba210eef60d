//! File import integration tests

mod common;

use common::*;
use eucleia_runtime::{Eucleia, Value};
use pretty_assertions::assert_eq;
use std::fs;

fn write_script(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_run_file_with_local_import() {
    let dir = tempfile::tempdir().unwrap();
    write_script(&dir, "lib.eu", "func double(int n) { return n * 2; }\n");
    let main = write_script(&dir, "main.eu", "import \"lib.eu\"\ndouble(21);\n");

    let runtime = Eucleia::new();
    let result = runtime.run_file(&main).unwrap();
    assert_eq!(result, Some(Value::Int(42)));
}

#[test]
fn test_file_imported_once() {
    // A second import of the same file must not re-run its declarations
    // (which would fail with a name clash)
    let dir = tempfile::tempdir().unwrap();
    write_script(&dir, "state.eu", "int shared = 1;\n");
    let main = write_script(
        &dir,
        "main.eu",
        "import \"state.eu\"\nimport \"state.eu\"\nshared;\n",
    );

    let runtime = Eucleia::new();
    let result = runtime.run_file(&main).unwrap();
    assert_eq!(result, Some(Value::Int(1)));
}

#[test]
fn test_missing_import_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_script(&dir, "main.eu", "import \"ghost.eu\"\n");

    let runtime = Eucleia::new();
    let diagnostics = runtime.run_file(&main).unwrap_err();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, "EU0012");
}

#[test]
fn test_import_with_parse_error_reports_file() {
    let dir = tempfile::tempdir().unwrap();
    write_script(&dir, "broken.eu", "int x 1;\n");
    let main = write_script(&dir, "main.eu", "import \"broken.eu\"\n");

    let runtime = Eucleia::new();
    let diagnostics = runtime.run_file(&main).unwrap_err();
    assert_eq!(diagnostics[0].code, "EU0012");
    assert!(diagnostics[0].message.contains("broken.eu"));
}

#[test]
fn test_imported_types_usable() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        &dir,
        "shapes.eu",
        "class Square {\n int side = 4;\n func area() { return side * side; }\n}\n",
    );
    let main = write_script(
        &dir,
        "main.eu",
        "import \"shapes.eu\"\nSquare s;\ns.area();\n",
    );

    let runtime = Eucleia::new();
    let result = runtime.run_file(&main).unwrap();
    assert_eq!(result, Some(Value::Int(16)));
}
