//! Token dump command - print the lexer's output

use anyhow::Result;
use eucleia_runtime::Lexer;

use super::read_source;

/// Tokenize the source file and print one token per line
///
/// Lexer diagnostics are printed to stderr but do not abort the dump; the
/// error tokens appear in the stream where they were produced.
pub fn run(file_path: &str) -> Result<()> {
    let source = read_source(file_path)?;

    let mut lexer = Lexer::new(source.as_str());
    let (tokens, diagnostics) = lexer.tokenize();

    for diag in &diagnostics {
        eprintln!("{}", diag.format_with_source(&source));
    }

    for token in &tokens {
        println!(
            "{:?} {:?} [{}..{}]",
            token.kind, token.lexeme, token.span.start, token.span.end
        );
    }

    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Lexer errors"))
    }
}
