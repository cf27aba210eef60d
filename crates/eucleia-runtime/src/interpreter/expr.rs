//! Expression evaluation

use crate::ast::*;
use crate::interpreter::stmt::array_index;
use crate::interpreter::Interpreter;
use crate::scope::{Scope, ScopeRef};
use crate::value::{RuntimeError, Value};
use std::rc::Rc;

impl Interpreter {
    /// Evaluate an expression to a value
    ///
    /// A call that produces no value (a void function in value position) is a
    /// type error here; statement position goes through `eval_expr_opt`.
    pub(crate) fn eval_expr(&mut self, expr: &Expr, scope: &ScopeRef) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit, _) => Ok(eval_literal(lit)),
            Expr::Identifier(id) => Scope::lookup(scope, &id.name, id.span),
            Expr::ArrayLiteral(array) => self.eval_array_literal(array, scope),
            Expr::Binary(binary) => self.eval_binary(binary, scope),
            Expr::Unary(unary) => {
                let operand = self.eval_expr(&unary.operand, scope)?;
                Value::unary(unary.op, &operand, unary.span)
            }
            Expr::IncDec(inc_dec) => self.eval_inc_dec(inc_dec, scope),
            Expr::Call(call) => {
                self.eval_call(call, scope)?
                    .ok_or_else(|| RuntimeError::TypeMismatch {
                        msg: format!("{}() returned no value", call.callee.name),
                        span: call.span,
                    })
            }
            Expr::MethodCall(call) => self
                .call_method(&call.target, &call.method, &call.args, scope, call.span)?
                .ok_or_else(|| RuntimeError::TypeMismatch {
                    msg: format!(
                        "{}.{}() returned no value",
                        call.target.name, call.method.name
                    ),
                    span: call.span,
                }),
            Expr::Member(member) => {
                let value = Scope::lookup(scope, &member.target.name, member.target.span)?;
                let instance = value.as_struct(member.target.span)?;
                Scope::lookup(&instance.fields, &member.field.name, member.field.span).map_err(
                    |_| RuntimeError::UndefinedVariable {
                        name: format!("{}.{}", member.target.name, member.field.name),
                        span: member.field.span,
                    },
                )
            }
            Expr::Index(index) => {
                let target = self.eval_expr(&index.target, scope)?;
                let array = target.as_array(index.target.span())?;
                let idx = self.eval_expr(&index.index, scope)?.as_int(index.index.span())?;
                array_index(array, idx, index.span)
            }
            Expr::Group(group) => self.eval_expr(&group.expr, scope),
        }
    }

    /// Evaluate an expression in statement position, where "no value" is fine
    pub(crate) fn eval_expr_opt(
        &mut self,
        expr: &Expr,
        scope: &ScopeRef,
    ) -> Result<Option<Value>, RuntimeError> {
        match expr {
            Expr::Call(call) => self.eval_call(call, scope),
            Expr::MethodCall(call) => {
                self.call_method(&call.target, &call.method, &call.args, scope, call.span)
            }
            other => self.eval_expr(other, scope).map(Some),
        }
    }

    /// Dispatch a call: native functions receive the unevaluated argument
    /// nodes and the calling scope; user functions go through the full call
    /// protocol
    pub(crate) fn eval_call(
        &mut self,
        call: &CallExpr,
        scope: &ScopeRef,
    ) -> Result<Option<Value>, RuntimeError> {
        let callee = Scope::lookup(scope, &call.callee.name, call.callee.span)?;
        match callee {
            Value::Function(func) => self.call_function(&func, &call.args, scope, call.span),
            Value::NativeFunction(native) => {
                let func = Rc::clone(&native.func);
                func(&call.args, scope, self)
            }
            other => Err(RuntimeError::TypeMismatch {
                msg: format!(
                    "'{}' is not callable (found {})",
                    call.callee.name,
                    other.type_name()
                ),
                span: call.callee.span,
            }),
        }
    }

    /// Array literal: every element is deep-cloned into the new array
    fn eval_array_literal(
        &mut self,
        array: &ArrayLiteral,
        scope: &ScopeRef,
    ) -> Result<Value, RuntimeError> {
        let mut elements = Vec::with_capacity(array.elements.len());
        for element in &array.elements {
            elements.push(self.eval_expr(element, scope)?.deep_clone());
        }
        Ok(Value::array(elements))
    }

    fn eval_binary(&mut self, binary: &BinaryExpr, scope: &ScopeRef) -> Result<Value, RuntimeError> {
        // Short-circuit evaluation for && and ||
        if binary.op == BinaryOp::And {
            let left = self.eval_expr(&binary.left, scope)?.as_bool(binary.left.span())?;
            if !left {
                return Ok(Value::Bool(false));
            }
            let right = self
                .eval_expr(&binary.right, scope)?
                .as_bool(binary.right.span())?;
            return Ok(Value::Bool(right));
        }
        if binary.op == BinaryOp::Or {
            let left = self.eval_expr(&binary.left, scope)?.as_bool(binary.left.span())?;
            if left {
                return Ok(Value::Bool(true));
            }
            let right = self
                .eval_expr(&binary.right, scope)?
                .as_bool(binary.right.span())?;
            return Ok(Value::Bool(right));
        }

        let left = self.eval_expr(&binary.left, scope)?;
        let right = self.eval_expr(&binary.right, scope)?;
        Value::binary(binary.op, &left, &right, binary.span)
    }

    /// `++x` / `x--`: the operand must name a variable; the bound value is
    /// mutated in place (write-through) and the updated value is the result
    fn eval_inc_dec(&mut self, inc_dec: &IncDecExpr, scope: &ScopeRef) -> Result<Value, RuntimeError> {
        let current = Scope::lookup(scope, &inc_dec.target.name, inc_dec.target.span)?;
        let step: i64 = match inc_dec.op {
            IncDecOp::Increment => 1,
            IncDecOp::Decrement => -1,
        };
        let updated = match current {
            // Same wrap-on-overflow rule as the binary arithmetic operators
            Value::Int(n) => Value::Int(n.wrapping_add(step)),
            Value::Float(f) => Value::Float(f + step as f64),
            other => {
                let op = match inc_dec.op {
                    IncDecOp::Increment => "++",
                    IncDecOp::Decrement => "--",
                };
                return Err(RuntimeError::OperatorNotSupported {
                    op: op.to_string(),
                    operands: other.type_name().to_string(),
                    span: inc_dec.span,
                });
            }
        };
        Scope::update(scope, &inc_dec.target.name, updated.clone(), inc_dec.span)?;
        Ok(updated)
    }
}

fn eval_literal(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::String(s) => Value::String(s.clone()),
    }
}
