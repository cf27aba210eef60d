//! AST dump command - output the parsed program as JSON

use anyhow::Result;
use eucleia_runtime::{Lexer, Parser};

use super::read_source;

/// Parse the source file and print its AST as JSON to stdout
pub fn run(file_path: &str, pretty: bool) -> Result<()> {
    let source = read_source(file_path)?;

    let mut lexer = Lexer::new(source.as_str());
    let (tokens, lex_diagnostics) = lexer.tokenize();
    if !lex_diagnostics.is_empty() {
        for diag in &lex_diagnostics {
            eprintln!("{}", diag.format_with_source(&source));
        }
        return Err(anyhow::anyhow!("Lexer errors"));
    }

    let mut parser = Parser::new(tokens);
    let (program, parse_diagnostics) = parser.parse();
    if !parse_diagnostics.is_empty() {
        for diag in &parse_diagnostics {
            eprintln!("{}", diag.format_with_source(&source));
        }
        return Err(anyhow::anyhow!("Parse errors"));
    }

    let output = if pretty {
        serde_json::to_string_pretty(&program)?
    } else {
        serde_json::to_string(&program)?
    };
    println!("{}", output);
    Ok(())
}
