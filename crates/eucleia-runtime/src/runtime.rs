//! Eucleia runtime API for embedding

use crate::diagnostic::Diagnostic;
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::scope::{Scope, ScopeRef};
use crate::span::Span;
use crate::value::Value;
use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, Vec<Diagnostic>>;

/// Eucleia runtime instance
///
/// Provides a high-level API for embedding Eucleia in host applications.
/// Global state (variables, functions, types, imports) persists across
/// `eval` calls on the same instance.
///
/// # Examples
///
/// ```
/// use eucleia_runtime::Eucleia;
///
/// let runtime = Eucleia::new();
/// let result = runtime.eval("int x = 1 + 2; x;");
/// ```
pub struct Eucleia {
    interpreter: RefCell<Interpreter>,
    globals: ScopeRef,
}

impl Eucleia {
    /// Create a new Eucleia runtime instance
    pub fn new() -> Self {
        Self {
            interpreter: RefCell::new(Interpreter::new()),
            globals: Scope::global(),
        }
    }

    /// Redirect interpreter output (`io.print`) to the given sink
    pub fn set_output(&self, output: Rc<RefCell<dyn Write>>) {
        self.interpreter.borrow_mut().set_output(output);
    }

    /// Evaluate Eucleia source code in the global scope
    ///
    /// Returns the value of the last expression statement at top level (if
    /// any), or every diagnostic collected when the source fails to lex or
    /// parse. Runtime errors produce a single diagnostic.
    ///
    /// # Examples
    ///
    /// ```
    /// use eucleia_runtime::{Eucleia, Value};
    ///
    /// let runtime = Eucleia::new();
    /// match runtime.eval("3 * 4;") {
    ///     Ok(Some(Value::Int(n))) => assert_eq!(n, 12),
    ///     other => panic!("Unexpected result: {:?}", other),
    /// }
    /// ```
    pub fn eval(&self, source: &str) -> RuntimeResult<Option<Value>> {
        let mut lexer = Lexer::new(source);
        let (tokens, lex_diagnostics) = lexer.tokenize();
        if !lex_diagnostics.is_empty() {
            return Err(lex_diagnostics);
        }

        let mut parser = Parser::new(tokens);
        let (program, parse_diagnostics) = parser.parse();
        if !parse_diagnostics.is_empty() {
            return Err(parse_diagnostics);
        }

        let mut interpreter = self.interpreter.borrow_mut();
        interpreter
            .eval(&program, &self.globals)
            .map_err(|err| vec![Diagnostic::from(err)])
    }

    /// Evaluate a Eucleia source file
    ///
    /// Imports inside the file resolve relative to the file's directory.
    pub fn run_file(&self, path: impl AsRef<Path>) -> RuntimeResult<Option<Value>> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| {
            vec![Diagnostic::error(
                format!("Failed to read '{}': {}", path.display(), err),
                Span::dummy(),
            )]
        })?;

        if let Some(dir) = path.parent() {
            self.interpreter.borrow_mut().set_base_dir(dir);
        }

        self.eval(&source)
    }

    /// The global scope of this runtime instance
    pub fn globals(&self) -> ScopeRef {
        Rc::clone(&self.globals)
    }
}

impl Default for Eucleia {
    fn default() -> Self {
        Self::new()
    }
}
