pub mod ast;
pub mod run;
pub mod tokens;

use anyhow::{Context, Result};
use std::fs;

/// Read a source file, mapping I/O failures to a user-facing error
pub fn read_source(file_path: &str) -> Result<String> {
    fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read source file: {}", file_path))
}
