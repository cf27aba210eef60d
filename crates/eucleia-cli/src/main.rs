use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

/// Eucleia programming language interpreter.
///
/// Eucleia is a small, C-flavored scripting language with value semantics,
/// structs and classes with single inheritance, and a module-based standard
/// library. This CLI runs Eucleia programs and inspects their frontend output.
///
/// EXAMPLES:
///     eucleia run main.eu          Run a Eucleia program
///     eucleia ast main.eu          Dump the parsed AST as JSON
///     eucleia tokens main.eu       Dump the token stream
///
/// ENVIRONMENT VARIABLES:
///     EUCLEIA_JSON    Set to '1' for JSON diagnostics by default
#[derive(Parser)]
#[command(name = "eucleia")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Eucleia source file
    ///
    /// Interprets the specified file, writing program output to stdout and
    /// diagnostics to stderr.
    ///
    /// EXAMPLES:
    ///     eucleia run main.eu            Run a program
    ///     eucleia run main.eu --json     Output diagnostics as JSON
    #[command(visible_alias = "r")]
    Run {
        /// Path to the Eucleia source file
        file: String,
        /// Output diagnostics in JSON format
        #[arg(long, env = "EUCLEIA_JSON")]
        json: bool,
    },

    /// Parse a source file and dump its AST as JSON
    ///
    /// Stops after parsing; nothing is executed.
    Ast {
        /// Path to the Eucleia source file
        file: String,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Tokenize a source file and dump the token stream
    ///
    /// One token per line with its kind, lexeme, and byte span.
    Tokens {
        /// Path to the Eucleia source file
        file: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, json } => commands::run::run(&file, json),
        Commands::Ast { file, pretty } => commands::ast::run(&file, pretty),
        Commands::Tokens { file } => commands::tokens::run(&file),
    }
}
