//! Import resolution
//!
//! Tracks which stdlib modules and user files have already been imported so
//! each is brought in at most once, and turns `import "file"` paths into
//! parsed programs. Paths are resolved relative to a base directory (the
//! importing script's directory when running a file).

use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::span::Span;
use crate::value::RuntimeError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Import bookkeeping and file loading
#[derive(Debug)]
pub struct ModuleLoader {
    base_dir: PathBuf,
    loaded_files: HashSet<PathBuf>,
    imported_modules: HashSet<String>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            loaded_files: HashSet::new(),
            imported_modules: HashSet::new(),
        }
    }

    pub fn set_base_dir(&mut self, dir: impl AsRef<Path>) {
        self.base_dir = dir.as_ref().to_path_buf();
    }

    /// True the first time a stdlib module name is imported
    pub fn first_module_import(&mut self, name: &str) -> bool {
        self.imported_modules.insert(name.to_string())
    }

    /// Load and parse a user file; `None` if it was already imported
    pub fn load_file(
        &mut self,
        path: &str,
        span: Span,
    ) -> Result<Option<crate::ast::Program>, RuntimeError> {
        let resolved = self.base_dir.join(path);
        let canonical = resolved
            .canonicalize()
            .map_err(|err| RuntimeError::ImportError {
                msg: format!("cannot resolve '{}': {}", resolved.display(), err),
                span,
            })?;

        if !self.loaded_files.insert(canonical.clone()) {
            return Ok(None);
        }

        let source = fs::read_to_string(&canonical).map_err(|err| RuntimeError::ImportError {
            msg: format!("cannot read '{}': {}", canonical.display(), err),
            span,
        })?;

        let mut lexer = Lexer::new(source);
        let (tokens, lex_diagnostics) = lexer.tokenize();
        if let Some(first) = lex_diagnostics.first() {
            return Err(RuntimeError::ImportError {
                msg: format!("in '{}': {}", path, first.message),
                span,
            });
        }

        let mut parser = Parser::new(tokens);
        let (program, parse_diagnostics) = parser.parse();
        if let Some(first) = parse_diagnostics.first() {
            return Err(RuntimeError::ImportError {
                msg: format!("in '{}': {}", path, first.message),
                span,
            });
        }

        Ok(Some(program))
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}
