//! Runtime value representation
//!
//! The closed tagged union every Eucleia value lives in:
//! - Int, Float, Bool: immediate values
//! - String: owned, value semantics
//! - Array: shared handle with an explicit `deep_clone` — language-level
//!   copy-on-assignment is enforced by the evaluator, not the host
//! - Struct: an instance with its own private field scope
//! - Function / NativeFunction: user and host callables
//!
//! Binary/unary operator rules live here too (numeric promotion, the
//! string/array/bool operator whitelists), so the evaluator only dispatches.

use crate::ast::{BinaryOp, Expr, FunctionDecl, UnaryOp};
use crate::interpreter::Interpreter;
use crate::scope::{Scope, ScopeRef};
use crate::span::Span;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Fatal evaluation errors
///
/// Eucleia has no catch/recover construct: every variant aborts the whole
/// program and surfaces at the top-level driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Lookup or update of a name with no reachable binding
    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String, span: Span },
    /// Re-declaration of a name already created in the same scope
    #[error("Name clash: '{name}' is already defined in this scope")]
    NameClash { name: String, span: Span },
    /// Incompatible value tags (assignment, update, argument passing, cast)
    #[error("Type mismatch: {msg}")]
    TypeMismatch { msg: String, span: Span },
    /// Call-site argument count differs from the declared parameter count
    #[error("Arity mismatch: {name}() expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    /// Operator applied to a tag combination with no defined rule
    #[error("Operator '{op}' is not supported for {operands}")]
    OperatorNotSupported {
        op: String,
        operands: String,
        span: Span,
    },
    /// Array access outside `[0, length)`
    #[error("Array index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: i64, len: usize, span: Span },
    /// Integer or float division/modulo by zero
    #[error("Division by zero")]
    DivideByZero { span: Span },
    /// Struct/class instance or definition evaluated more than once
    #[error("{msg}")]
    DoubleInstantiation { msg: String, span: Span },
    /// `break` outside a loop, `return` outside a function call
    #[error("{msg}")]
    ControlFlowMisuse { msg: String, span: Span },
    /// Reference to a struct/class type that was never defined
    #[error("Unknown type: {name}")]
    UnknownType { name: String, span: Span },
    /// Module or file import failure
    #[error("Import error: {msg}")]
    ImportError { msg: String, span: Span },
}

impl RuntimeError {
    /// Stable error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeError::UndefinedVariable { .. } => "EU0002",
            RuntimeError::NameClash { .. } => "EU0003",
            RuntimeError::TypeMismatch { .. } => "EU0004",
            RuntimeError::ArityMismatch { .. } => "EU0005",
            RuntimeError::OperatorNotSupported { .. } => "EU0006",
            RuntimeError::IndexOutOfBounds { .. } => "EU0007",
            RuntimeError::DivideByZero { .. } => "EU0008",
            RuntimeError::DoubleInstantiation { .. } => "EU0009",
            RuntimeError::ControlFlowMisuse { .. } => "EU0010",
            RuntimeError::UnknownType { .. } => "EU0011",
            RuntimeError::ImportError { .. } => "EU0012",
        }
    }

    /// Source location of the failure
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::NameClash { span, .. }
            | RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::OperatorNotSupported { span, .. }
            | RuntimeError::IndexOutOfBounds { span, .. }
            | RuntimeError::DivideByZero { span }
            | RuntimeError::DoubleInstantiation { span, .. }
            | RuntimeError::ControlFlowMisuse { span, .. }
            | RuntimeError::UnknownType { span, .. }
            | RuntimeError::ImportError { span, .. } => *span,
        }
    }
}

/// Array handle. Cloning the handle aliases the same storage; the evaluator
/// calls `deep_clone` at every point where the language requires a copy
/// (assignment, argument passing, return, element insertion).
#[derive(Clone, Debug)]
pub struct ValueArray(Rc<RefCell<Vec<Value>>>);

impl ValueArray {
    pub fn new() -> Self {
        ValueArray(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn from_vec(v: Vec<Value>) -> Self {
        ValueArray(Rc::new(RefCell::new(v)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Element by index (cloned handle; the stored value is not copied deeply)
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replace the element at `index`; false if out of range
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut inner = self.0.borrow_mut();
        if index < inner.len() {
            inner[index] = value;
            true
        } else {
            false
        }
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Independent copy of the contents (shallow handles)
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Independent deep copy of every element
    pub fn deep_clone(&self) -> ValueArray {
        let cloned: Vec<Value> = self.0.borrow().iter().map(Value::deep_clone).collect();
        ValueArray::from_vec(cloned)
    }
}

impl Default for ValueArray {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ValueArray {
    fn eq(&self, other: &Self) -> bool {
        *self.0.borrow() == *other.0.borrow()
    }
}

impl FromIterator<Value> for ValueArray {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ValueArray::from_vec(iter.into_iter().collect())
    }
}

/// A struct or class instance: its type name plus the private scope holding
/// its fields (and, for classes, its bound methods). Cloning the handle
/// aliases the same instance; `deep_clone` produces an independent one.
#[derive(Debug, Clone)]
pub struct StructInstance {
    pub type_name: String,
    pub fields: ScopeRef,
}

impl StructInstance {
    /// Independent copy: a fresh detached field scope with every field
    /// deep-cloned
    pub fn deep_clone(&self) -> StructInstance {
        StructInstance {
            type_name: self.type_name.clone(),
            fields: Scope::deep_clone_detached(&self.fields),
        }
    }
}

impl PartialEq for StructInstance {
    fn eq(&self, other: &Self) -> bool {
        // Identity: two instances are equal only if they are the same instance
        self.type_name == other.type_name && Rc::ptr_eq(&self.fields, &other.fields)
    }
}

/// Reference to a user function's defining AST node (immutable once created)
#[derive(Debug, Clone)]
pub struct FunctionRef {
    pub decl: Rc<FunctionDecl>,
}

impl FunctionRef {
    pub fn new(decl: Rc<FunctionDecl>) -> Self {
        Self { decl }
    }

    pub fn name(&self) -> &str {
        &self.decl.name.name
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.decl, &other.decl)
    }
}

/// Native function type — a host closure callable from Eucleia
///
/// Natives receive the *unevaluated* argument nodes and the calling scope,
/// and control their own argument evaluation order.
pub type NativeFn =
    Rc<dyn Fn(&[Expr], &ScopeRef, &mut Interpreter) -> Result<Option<Value>, RuntimeError>>;

/// A named native function bound into a scope by a module import
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>, func: NativeFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native func {}>", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        // Closures have no content equality; identity only
        Rc::ptr_eq(&self.func, &other.func)
    }
}

/// Runtime value type
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// IEEE 754 double-precision float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Owned string (value semantics)
    String(String),
    /// Ordered sequence (deep-copied on assignment by the evaluator)
    Array(ValueArray),
    /// Struct/class instance
    Struct(StructInstance),
    /// User-defined function
    Function(FunctionRef),
    /// Host-provided function
    NativeFunction(NativeFunction),
}

impl Value {
    /// Create a new array value
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(ValueArray::from_vec(values))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Struct(instance) => &instance.type_name,
            Value::Function(_) => "func",
            Value::NativeFunction(_) => "func",
        }
    }

    /// True if both values carry the same tag (structs also compare type name)
    pub fn same_tag(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Struct(a), Value::Struct(b)) => a.type_name == b.type_name,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    /// True if this value satisfies the given declared type name
    ///
    /// An `int` is accepted where `float` is declared (promoted at the
    /// binding site); everything else requires an exact tag match.
    pub fn matches_type(&self, declared: &str) -> bool {
        match declared {
            "int" => matches!(self, Value::Int(_)),
            "float" => matches!(self, Value::Float(_) | Value::Int(_)),
            "bool" => matches!(self, Value::Bool(_)),
            "string" => matches!(self, Value::String(_)),
            "array" => matches!(self, Value::Array(_)),
            name => matches!(self, Value::Struct(instance) if instance.type_name == name),
        }
    }

    /// Deep copy: an independent value sharing no mutable storage with `self`
    ///
    /// Required before a value escapes its owning scope — return values,
    /// argument passing, assignment, and element/field copies.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Int(_)
            | Value::Float(_)
            | Value::Bool(_)
            | Value::String(_)
            | Value::Function(_)
            | Value::NativeFunction(_) => self.clone(),
            Value::Array(arr) => Value::Array(arr.deep_clone()),
            Value::Struct(instance) => Value::Struct(instance.deep_clone()),
        }
    }

    // === Cast helpers (fail with TypeMismatch on the wrong tag) ===

    pub fn as_int(&self, span: Span) -> Result<i64, RuntimeError> {
        match self {
            Value::Int(n) => Ok(*n),
            _ => Err(self.cast_error("int", span)),
        }
    }

    /// Float cast with Int promotion
    pub fn as_float(&self, span: Span) -> Result<f64, RuntimeError> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            _ => Err(self.cast_error("float", span)),
        }
    }

    pub fn as_bool(&self, span: Span) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.cast_error("bool", span)),
        }
    }

    pub fn as_str(&self, span: Span) -> Result<&str, RuntimeError> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.cast_error("string", span)),
        }
    }

    pub fn as_array(&self, span: Span) -> Result<&ValueArray, RuntimeError> {
        match self {
            Value::Array(arr) => Ok(arr),
            _ => Err(self.cast_error("array", span)),
        }
    }

    pub fn as_struct(&self, span: Span) -> Result<&StructInstance, RuntimeError> {
        match self {
            Value::Struct(instance) => Ok(instance),
            _ => Err(self.cast_error("struct instance", span)),
        }
    }

    fn cast_error(&self, wanted: &str, span: Span) -> RuntimeError {
        RuntimeError::TypeMismatch {
            msg: format!("expected {}, found {}", wanted, self.type_name()),
            span,
        }
    }

    // === Operator rules ===

    /// Apply a binary operator
    ///
    /// Promotion: Int op Int stays Int (comparisons yield Bool), any Float
    /// operand promotes the other side to Float. Strings support `+ == !=`,
    /// arrays support only `+` (element-wise deep copy of both sides), bools
    /// support `== != && ||`. Anything else is OperatorNotSupported.
    pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value, span: Span) -> Result<Value, RuntimeError> {
        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Self::int_binary(op, *a, *b, span),
            (Value::Float(a), Value::Float(b)) => Self::float_binary(op, *a, *b, span),
            (Value::Int(a), Value::Float(b)) => Self::float_binary(op, *a as f64, *b, span),
            (Value::Float(a), Value::Int(b)) => Self::float_binary(op, *a, *b as f64, span),
            (Value::String(a), Value::String(b)) => match op {
                BinaryOp::Add => Ok(Value::String(format!("{}{}", a, b))),
                BinaryOp::Equal => Ok(Value::Bool(a == b)),
                BinaryOp::NotEqual => Ok(Value::Bool(a != b)),
                _ => Err(Self::unsupported(op, lhs, rhs, span)),
            },
            (Value::Array(a), Value::Array(b)) => match op {
                BinaryOp::Add => {
                    let mut joined: Vec<Value> =
                        a.to_vec().iter().map(Value::deep_clone).collect();
                    joined.extend(b.to_vec().iter().map(Value::deep_clone));
                    Ok(Value::array(joined))
                }
                _ => Err(Self::unsupported(op, lhs, rhs, span)),
            },
            (Value::Bool(a), Value::Bool(b)) => match op {
                BinaryOp::Equal => Ok(Value::Bool(a == b)),
                BinaryOp::NotEqual => Ok(Value::Bool(a != b)),
                BinaryOp::And => Ok(Value::Bool(*a && *b)),
                BinaryOp::Or => Ok(Value::Bool(*a || *b)),
                _ => Err(Self::unsupported(op, lhs, rhs, span)),
            },
            _ => Err(Self::unsupported(op, lhs, rhs, span)),
        }
    }

    fn int_binary(op: BinaryOp, a: i64, b: i64, span: Span) -> Result<Value, RuntimeError> {
        let value = match op {
            BinaryOp::Add => Value::Int(a.wrapping_add(b)),
            BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
            BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
            // Truncating division, like C
            BinaryOp::Div => {
                if b == 0 {
                    return Err(RuntimeError::DivideByZero { span });
                }
                Value::Int(a.wrapping_div(b))
            }
            BinaryOp::Mod => {
                if b == 0 {
                    return Err(RuntimeError::DivideByZero { span });
                }
                Value::Int(a.wrapping_rem(b))
            }
            BinaryOp::Less => Value::Bool(a < b),
            BinaryOp::LessEqual => Value::Bool(a <= b),
            BinaryOp::Greater => Value::Bool(a > b),
            BinaryOp::GreaterEqual => Value::Bool(a >= b),
            BinaryOp::Equal => Value::Bool(a == b),
            BinaryOp::NotEqual => Value::Bool(a != b),
            BinaryOp::And | BinaryOp::Or => {
                return Err(Self::unsupported(op, &Value::Int(a), &Value::Int(b), span));
            }
        };
        Ok(value)
    }

    fn float_binary(op: BinaryOp, a: f64, b: f64, span: Span) -> Result<Value, RuntimeError> {
        let value = match op {
            BinaryOp::Add => Value::Float(a + b),
            BinaryOp::Sub => Value::Float(a - b),
            BinaryOp::Mul => Value::Float(a * b),
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(RuntimeError::DivideByZero { span });
                }
                Value::Float(a / b)
            }
            BinaryOp::Mod => {
                if b == 0.0 {
                    return Err(RuntimeError::DivideByZero { span });
                }
                Value::Float(a % b)
            }
            BinaryOp::Less => Value::Bool(a < b),
            BinaryOp::LessEqual => Value::Bool(a <= b),
            BinaryOp::Greater => Value::Bool(a > b),
            BinaryOp::GreaterEqual => Value::Bool(a >= b),
            BinaryOp::Equal => Value::Bool(a == b),
            BinaryOp::NotEqual => Value::Bool(a != b),
            BinaryOp::And | BinaryOp::Or => {
                return Err(Self::unsupported(
                    op,
                    &Value::Float(a),
                    &Value::Float(b),
                    span,
                ));
            }
        };
        Ok(value)
    }

    /// Apply a unary operator (`-` on numbers, `!` on bools)
    pub fn unary(op: UnaryOp, operand: &Value, span: Span) -> Result<Value, RuntimeError> {
        match (op, operand) {
            (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
            (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            _ => Err(RuntimeError::OperatorNotSupported {
                op: op.to_string(),
                operands: operand.type_name().to_string(),
                span,
            }),
        }
    }

    fn unsupported(op: BinaryOp, lhs: &Value, rhs: &Value, span: Span) -> RuntimeError {
        RuntimeError::OperatorNotSupported {
            op: op.to_string(),
            operands: format!("{} and {}", lhs.type_name(), rhs.type_name()),
            span,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, elem) in arr.to_vec().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, "]")
            }
            Value::Struct(instance) => write!(f, "<{} instance>", instance.type_name),
            Value::Function(func) => write!(f, "<func {}>", func.name()),
            Value::NativeFunction(native) => write!(f, "<native func {}>", native.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_promotion() {
        let result = Value::binary(
            BinaryOp::Add,
            &Value::Int(3),
            &Value::Float(2.5),
            Span::dummy(),
        )
        .unwrap();
        assert_eq!(result, Value::Float(5.5));
    }

    #[test]
    fn test_int_division_truncates() {
        let result = Value::binary(
            BinaryOp::Div,
            &Value::Int(7),
            &Value::Int(2),
            Span::dummy(),
        )
        .unwrap();
        assert_eq!(result, Value::Int(3));
    }

    #[test]
    fn test_int_modulo_by_zero() {
        let result = Value::binary(
            BinaryOp::Mod,
            &Value::Int(7),
            &Value::Int(0),
            Span::dummy(),
        );
        assert_eq!(result, Err(RuntimeError::DivideByZero { span: Span::dummy() }));
    }

    #[test]
    fn test_string_rules() {
        let a = Value::String("foo".to_string());
        let b = Value::String("bar".to_string());
        assert_eq!(
            Value::binary(BinaryOp::Add, &a, &b, Span::dummy()).unwrap(),
            Value::String("foobar".to_string())
        );
        assert!(Value::binary(BinaryOp::Less, &a, &b, Span::dummy()).is_err());
    }

    #[test]
    fn test_array_concat_is_independent() {
        let a = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::array(vec![Value::Int(3)]);
        let joined = Value::binary(BinaryOp::Add, &a, &b, Span::dummy()).unwrap();
        assert_eq!(
            joined,
            Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        // Mutating the result must not touch the operands
        if let Value::Array(arr) = &joined {
            arr.set(0, Value::Int(99));
        }
        assert_eq!(a, Value::array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_array_deep_clone_independence() {
        let inner = ValueArray::from_vec(vec![Value::Int(1)]);
        let outer = ValueArray::from_vec(vec![Value::Array(inner.clone())]);
        let copy = outer.deep_clone();
        inner.set(0, Value::Int(42));
        let copied_inner = copy.get(0).unwrap();
        assert_eq!(
            copied_inner,
            Value::Array(ValueArray::from_vec(vec![Value::Int(1)]))
        );
    }

    #[test]
    fn test_mixed_tag_operator_rejected() {
        let result = Value::binary(
            BinaryOp::Add,
            &Value::Int(1),
            &Value::String("x".to_string()),
            Span::dummy(),
        );
        assert!(matches!(
            result,
            Err(RuntimeError::OperatorNotSupported { .. })
        ));
    }

    #[test]
    fn test_matches_type_promotion() {
        assert!(Value::Int(1).matches_type("float"));
        assert!(!Value::Float(1.0).matches_type("int"));
    }
}
