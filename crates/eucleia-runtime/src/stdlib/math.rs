//! Math standard library functions
//!
//! Float math over promoted arguments: every function accepts int or float
//! and returns float, except `abs` which preserves the argument's tag.

use crate::ast::Expr;
use crate::interpreter::Interpreter;
use crate::scope::ScopeRef;
use crate::span::Span;
use crate::value::{NativeFunction, RuntimeError, Value};
use std::rc::Rc;

/// Native functions exported by `import <math>`
pub fn natives() -> Vec<NativeFunction> {
    vec![
        unary_native("sqrt", f64::sqrt),
        unary_native("floor", f64::floor),
        unary_native("ceil", f64::ceil),
        unary_native("round", f64::round),
        unary_native("sin", f64::sin),
        unary_native("cos", f64::cos),
        unary_native("tan", f64::tan),
        unary_native("exp", f64::exp),
        unary_native("log", f64::ln),
        NativeFunction::new("pow", Rc::new(pow)),
        NativeFunction::new("abs", Rc::new(abs)),
    ]
}

fn check_arity(
    name: &str,
    expected: usize,
    args: &[Expr],
) -> Result<(), RuntimeError> {
    if args.len() != expected {
        let span = args.first().map(Expr::span).unwrap_or_else(Span::dummy);
        return Err(RuntimeError::ArityMismatch {
            name: name.to_string(),
            expected,
            found: args.len(),
            span,
        });
    }
    Ok(())
}

/// Build a one-argument float -> float native
fn unary_native(name: &'static str, f: fn(f64) -> f64) -> NativeFunction {
    NativeFunction::new(
        name,
        Rc::new(
            move |args: &[Expr], scope: &ScopeRef, interp: &mut Interpreter| {
                check_arity(name, 1, args)?;
                let x = interp.eval_expr(&args[0], scope)?.as_float(args[0].span())?;
                Ok(Some(Value::Float(f(x))))
            },
        ),
    )
}

/// pow(x, y) -> float
fn pow(
    args: &[Expr],
    scope: &ScopeRef,
    interp: &mut Interpreter,
) -> Result<Option<Value>, RuntimeError> {
    check_arity("pow", 2, args)?;
    let x = interp.eval_expr(&args[0], scope)?.as_float(args[0].span())?;
    let y = interp.eval_expr(&args[1], scope)?.as_float(args[1].span())?;
    Ok(Some(Value::Float(x.powf(y))))
}

/// abs(x) -> same tag as x
fn abs(
    args: &[Expr],
    scope: &ScopeRef,
    interp: &mut Interpreter,
) -> Result<Option<Value>, RuntimeError> {
    check_arity("abs", 1, args)?;
    let value = interp.eval_expr(&args[0], scope)?;
    match value {
        Value::Int(n) => Ok(Some(Value::Int(n.wrapping_abs()))),
        Value::Float(f) => Ok(Some(Value::Float(f.abs()))),
        other => Err(RuntimeError::TypeMismatch {
            msg: format!("abs() expects a number, found {}", other.type_name()),
            span: args[0].span(),
        }),
    }
}
