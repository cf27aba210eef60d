//! Shared test utilities
//!
//! Common helpers for Eucleia integration tests to reduce boilerplate.

use eucleia_runtime::{Eucleia, RuntimeError, Value};
use std::cell::RefCell;
use std::rc::Rc;

// Re-export testing utilities
#[allow(unused_imports)]
pub use pretty_assertions::{assert_eq, assert_ne};

/// Evaluate source and return the last top-level expression value
#[allow(dead_code)]
pub fn eval(source: &str) -> Option<Value> {
    let runtime = Eucleia::new();
    match runtime.eval(source) {
        Ok(value) => value,
        Err(diagnostics) => panic!("Evaluation failed: {:?}", diagnostics),
    }
}

/// Assert that source evaluates to an int
#[allow(dead_code)]
pub fn assert_eval_int(source: &str, expected: i64) {
    match eval(source) {
        Some(Value::Int(n)) => assert_eq!(n, expected, "Expected {}, got {}", expected, n),
        other => panic!("Expected Int({}), got {:?}", expected, other),
    }
}

/// Assert that source evaluates to a float
#[allow(dead_code)]
pub fn assert_eval_float(source: &str, expected: f64) {
    match eval(source) {
        Some(Value::Float(f)) => {
            assert!(
                (f - expected).abs() < 1e-9,
                "Expected {}, got {}",
                expected,
                f
            );
        }
        other => panic!("Expected Float({}), got {:?}", expected, other),
    }
}

/// Assert that source evaluates to a bool
#[allow(dead_code)]
pub fn assert_eval_bool(source: &str, expected: bool) {
    match eval(source) {
        Some(Value::Bool(b)) => assert_eq!(b, expected),
        other => panic!("Expected Bool({}), got {:?}", expected, other),
    }
}

/// Assert that source evaluates to a string
#[allow(dead_code)]
pub fn assert_eval_string(source: &str, expected: &str) {
    match eval(source) {
        Some(Value::String(s)) => assert_eq!(s, expected),
        other => panic!("Expected String({:?}), got {:?}", expected, other),
    }
}

/// Assert that source fails at runtime with the given error code
#[allow(dead_code)]
pub fn assert_runtime_error(source: &str, code: &str) {
    let runtime = Eucleia::new();
    match runtime.eval(source) {
        Err(diagnostics) => {
            assert_eq!(diagnostics.len(), 1, "Expected one diagnostic: {:?}", diagnostics);
            assert_eq!(
                diagnostics[0].code, code,
                "Expected code {}, got {:?}",
                code, diagnostics[0]
            );
        }
        Ok(value) => panic!("Expected {} error, got {:?}", code, value),
    }
}

/// Run source with `io` pre-imported and capture everything it prints
#[allow(dead_code)]
pub fn run_capture_output(source: &str) -> String {
    let buffer: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let runtime = Eucleia::new();
    runtime.set_output(buffer.clone());

    let full_source = format!("import <io>\n{}", source);
    if let Err(diagnostics) = runtime.eval(&full_source) {
        panic!("Evaluation failed: {:?}", diagnostics);
    }

    let bytes = buffer.borrow().clone();
    String::from_utf8(bytes).expect("output is valid UTF-8")
}

/// Map a single-diagnostic runtime failure back to its error code
#[allow(dead_code)]
pub fn error_code_of(result: Result<Option<Value>, Vec<eucleia_runtime::Diagnostic>>) -> String {
    match result {
        Err(diagnostics) if diagnostics.len() == 1 => diagnostics[0].code.clone(),
        other => panic!("Expected one diagnostic, got {:?}", other),
    }
}

/// Shorthand for RuntimeError codes used across the suites
#[allow(dead_code)]
pub fn code(err: &RuntimeError) -> &'static str {
    err.code()
}
