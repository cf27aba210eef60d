//! I/O standard library functions

use crate::ast::Expr;
use crate::interpreter::Interpreter;
use crate::scope::ScopeRef;
use crate::value::{NativeFunction, RuntimeError, Value};
use std::rc::Rc;

/// Native functions exported by `import <io>`
pub fn natives() -> Vec<NativeFunction> {
    vec![NativeFunction::new("print", Rc::new(print))]
}

/// print(...) -> none
///
/// Variadic: stringifies every argument, joins with single spaces, and
/// writes one line (trailing newline) to the interpreter's output sink.
fn print(
    args: &[Expr],
    scope: &ScopeRef,
    interp: &mut Interpreter,
) -> Result<Option<Value>, RuntimeError> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(interp.eval_expr(arg, scope)?.to_string());
    }
    interp.write_line(&parts.join(" "));
    Ok(None)
}
