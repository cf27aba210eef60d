//! Diagnostic reporting
//!
//! All lexer, parser, and runtime failures flow through the unified
//! Diagnostic type so the CLI and embedders render them consistently.

use crate::span::Span;
use crate::value::RuntimeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Fatal error that aborts evaluation
    Error,
    /// Warning that does not abort evaluation
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message (error or warning)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub level: DiagnosticLevel,
    /// Error code (e.g., "EU0003")
    pub code: String,
    /// Main diagnostic message
    pub message: String,
    /// Source location
    pub span: Span,
}

impl Diagnostic {
    /// Create an error diagnostic with the generic syntax-error code
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code: "EU0001".to_string(),
            message: message.into(),
            span,
        }
    }

    /// Create an error diagnostic with an explicit code
    pub fn error_with_code(code: &str, message: impl Into<String>, span: Span) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code: code.to_string(),
            message: message.into(),
            span,
        }
    }

    /// Render as `line:col: level[code]: message` against the given source
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = self.span.line_col(source);
        format!(
            "{}:{}: {}[{}]: {}",
            line, col, self.level, self.code, self.message
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.level, self.code, self.message)
    }
}

impl From<RuntimeError> for Diagnostic {
    fn from(err: RuntimeError) -> Self {
        Diagnostic::error_with_code(err.code(), err.to_string(), err.span())
    }
}
