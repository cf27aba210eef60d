//! Run command - execute Eucleia source files

use anyhow::Result;
use eucleia_runtime::{Diagnostic, Eucleia};

use super::read_source;

/// Run a Eucleia source file
///
/// Program output goes to stdout; diagnostics go to stderr in either the
/// human-readable `line:col: level[code]: message` form or as JSON lines.
pub fn run(file_path: &str, json: bool) -> Result<()> {
    let source = read_source(file_path)?;

    let runtime = Eucleia::new();
    match runtime.run_file(file_path) {
        Ok(_) => Ok(()),
        Err(diagnostics) => {
            if !json {
                eprintln!("Errors occurred while running {}:", file_path);
            }
            for diag in &diagnostics {
                eprintln!("{}", format_diagnostic(diag, &source, json));
            }
            Err(anyhow::anyhow!("Failed to execute program"))
        }
    }
}

/// Format one diagnostic for stderr
fn format_diagnostic(diag: &Diagnostic, source: &str, json: bool) -> String {
    if json {
        serde_json::to_string(diag).unwrap_or_else(|_| diag.to_string())
    } else {
        diag.format_with_source(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn script(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_run_valid_program() {
        let file = script("int x = 1 + 2;\n");
        let result = run(file.path().to_str().unwrap(), false);
        assert!(result.is_ok());
    }

    #[test]
    fn test_run_program_with_runtime_error() {
        let file = script("int x = 1 / 0;\n");
        let result = run(file.path().to_str().unwrap(), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_missing_file() {
        let result = run("no-such-file.eu", false);
        assert!(result.is_err());
    }
}
