//! AST interpreter (tree-walking)
//!
//! Recursive evaluation over the AST with scope-based variable storage.
//! Control transfer (`break`, `return`) is a typed signal returned from every
//! statement-sequencing site, not unwinding or global jump state:
//! - loops consume `Flow::Break`
//! - function calls consume `Flow::Return`
//! - a signal reaching a boundary that cannot consume it is a fatal error

mod expr;
mod layout;
mod stmt;

pub(crate) use layout::TypeLayout;

use crate::ast::{
    Block, ClassDecl, Expr, Identifier, ImportDecl, ImportKind, Program, Stmt, StructDecl, TypeRef,
};
use crate::module_loader::ModuleLoader;
use crate::scope::{Scope, ScopeRef};
use crate::span::Span;
use crate::stdlib;
use crate::value::{FunctionRef, RuntimeError, StructInstance, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

/// Control flow signal threaded through statement execution
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
    /// Continue with the next statement
    Normal,
    /// Unwind to the innermost enclosing loop
    Break,
    /// Unwind to the innermost function call, carrying the pending value
    Return(Option<Value>),
}

/// A registered struct or class definition
#[derive(Debug, Clone)]
pub(crate) enum TypeDef {
    Struct(Rc<StructDecl>),
    Class(Rc<ClassDecl>),
}

/// Interpreter state
pub struct Interpreter {
    /// Struct/class definitions, registered by definition statements
    pub(crate) types: HashMap<String, TypeDef>,
    /// Memoized merged field/method tables per type
    pub(crate) layouts: HashMap<String, Rc<TypeLayout>>,
    /// Module and file import bookkeeping
    pub(crate) loader: ModuleLoader,
    /// Types currently being instantiated (innermost last); a field whose
    /// type is already on this stack would recurse forever
    instantiating: Vec<String>,
    /// Sink for `print` output; swappable so embedders can capture it
    output: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    /// Create a new interpreter writing program output to stdout
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            layouts: HashMap::new(),
            loader: ModuleLoader::new(),
            instantiating: Vec::new(),
            output: Rc::new(RefCell::new(io::stdout())),
        }
    }

    /// Redirect program output (e.g., into a buffer for tests)
    pub fn set_output(&mut self, sink: Rc<RefCell<dyn Write>>) {
        self.output = sink;
    }

    /// Base directory for resolving `import "file"` paths
    pub fn set_base_dir(&mut self, dir: impl AsRef<Path>) {
        self.loader.set_base_dir(dir);
    }

    /// Write one line of program output
    pub(crate) fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.output.borrow_mut(), "{}", line);
    }

    /// Evaluate a whole program against the given global scope
    ///
    /// Returns the value of the last top-level expression statement, if any
    /// (useful for embedding and the test suite; program output is a side
    /// effect on the output sink).
    pub fn eval(
        &mut self,
        program: &Program,
        scope: &ScopeRef,
    ) -> Result<Option<Value>, RuntimeError> {
        let mut last_value = None;

        for stmt in &program.stmts {
            match stmt {
                Stmt::Expr(expr_stmt) => {
                    last_value = self.eval_expr_opt(&expr_stmt.expr, scope)?;
                }
                _ => match self.exec_stmt(stmt, scope)? {
                    Flow::Normal => {}
                    Flow::Break => {
                        return Err(RuntimeError::ControlFlowMisuse {
                            msg: "'break' outside of a loop".to_string(),
                            span: stmt.span(),
                        });
                    }
                    Flow::Return(_) => {
                        return Err(RuntimeError::ControlFlowMisuse {
                            msg: "'return' outside of a function".to_string(),
                            span: stmt.span(),
                        });
                    }
                },
            }
        }

        Ok(last_value)
    }

    // === Function call protocol ===

    /// Call a user function
    ///
    /// Arguments are evaluated left to right in the caller's scope, checked
    /// against the declared parameter types, and deep-cloned into the
    /// function-local scope (pass by value). The local scope is a child of
    /// the caller's scope at the time of the call.
    pub(crate) fn call_function(
        &mut self,
        func: &FunctionRef,
        args: &[Expr],
        caller: &ScopeRef,
        call_span: Span,
    ) -> Result<Option<Value>, RuntimeError> {
        if args.len() != func.arity() {
            return Err(RuntimeError::ArityMismatch {
                name: func.name().to_string(),
                expected: func.arity(),
                found: args.len(),
                span: call_span,
            });
        }

        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.eval_expr(arg, caller)?);
        }

        let local = Scope::child_of(caller);
        for (param, value) in func.decl.params.iter().zip(evaluated) {
            let value = self.check_declared_type(value, &param.type_ref, || {
                format!(
                    "argument '{}' of {}()",
                    param.name.name,
                    func.name()
                )
            })?;
            local
                .borrow_mut()
                .define(&param.name.name, value.deep_clone(), param.span)?;
        }

        self.exec_function_body(&func.decl.body, &local)
    }

    /// Execute a function body, consuming the return signal
    ///
    /// The returned value is deep-cloned so it survives the function-local
    /// scope being dropped. A `break` signal escaping a function body has no
    /// enclosing loop to consume it and is fatal.
    pub(crate) fn exec_function_body(
        &mut self,
        body: &Block,
        local: &ScopeRef,
    ) -> Result<Option<Value>, RuntimeError> {
        for stmt in &body.stmts {
            match self.exec_stmt(stmt, local)? {
                Flow::Normal => {}
                Flow::Return(value) => return Ok(value.map(|v| v.deep_clone())),
                Flow::Break => {
                    return Err(RuntimeError::ControlFlowMisuse {
                        msg: "'break' outside of a loop".to_string(),
                        span: stmt.span(),
                    });
                }
            }
        }
        Ok(None)
    }

    /// Call a method on a struct/class instance
    ///
    /// The instance's field scope is temporarily re-parented to the calling
    /// scope so the method body sees both its own fields and the caller's
    /// surroundings, and detached again afterwards (success or error).
    pub(crate) fn call_method(
        &mut self,
        target: &Identifier,
        method: &Identifier,
        args: &[Expr],
        scope: &ScopeRef,
        call_span: Span,
    ) -> Result<Option<Value>, RuntimeError> {
        let value = Scope::lookup(scope, &target.name, target.span)?;
        let instance = value.as_struct(target.span)?.clone();

        let callee = Scope::lookup(&instance.fields, &method.name, method.span).map_err(|_| {
            RuntimeError::UndefinedVariable {
                name: format!("{}.{}", target.name, method.name),
                span: method.span,
            }
        })?;
        let func = match callee {
            Value::Function(func) => func,
            other => {
                return Err(RuntimeError::TypeMismatch {
                    msg: format!(
                        "'{}.{}' is a {}, not a method",
                        target.name,
                        method.name,
                        other.type_name()
                    ),
                    span: method.span,
                });
            }
        };

        Scope::set_parent(&instance.fields, Some(Rc::clone(scope)));
        let result = (|| {
            if args.len() != func.arity() {
                return Err(RuntimeError::ArityMismatch {
                    name: format!("{}.{}", target.name, method.name),
                    expected: func.arity(),
                    found: args.len(),
                    span: call_span,
                });
            }

            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(self.eval_expr(arg, scope)?);
            }

            let local = Scope::child_of(&instance.fields);
            for (param, value) in func.decl.params.iter().zip(evaluated) {
                let value = self.check_declared_type(value, &param.type_ref, || {
                    format!("argument '{}' of {}()", param.name.name, method.name)
                })?;
                local
                    .borrow_mut()
                    .define(&param.name.name, value.deep_clone(), param.span)?;
            }

            self.exec_function_body(&func.decl.body, &local)
        })();
        Scope::set_parent(&instance.fields, None);

        result
    }

    /// Check a value against a declared type, promoting Int where `float` is
    /// declared
    pub(crate) fn check_declared_type(
        &mut self,
        value: Value,
        type_ref: &TypeRef,
        what: impl FnOnce() -> String,
    ) -> Result<Value, RuntimeError> {
        if !value.matches_type(&type_ref.name) {
            return Err(RuntimeError::TypeMismatch {
                msg: format!(
                    "{} expects {}, found {}",
                    what(),
                    type_ref.name,
                    value.type_name()
                ),
                span: type_ref.span,
            });
        }
        if type_ref.name == "float" {
            if let Value::Int(n) = value {
                return Ok(Value::Float(n as f64));
            }
        }
        Ok(value)
    }

    // === Struct/class instantiation ===

    /// Instantiate a struct/class type and bind the instance in `scope`
    ///
    /// One-shot construction: re-instantiating a name that this scope already
    /// created is fatal.
    pub(crate) fn instantiate(
        &mut self,
        type_ref: &TypeRef,
        name: &Identifier,
        scope: &ScopeRef,
    ) -> Result<(), RuntimeError> {
        if scope.borrow().is_defined_here(&name.name) {
            return Err(RuntimeError::DoubleInstantiation {
                msg: format!("'{}' has already been instantiated", name.name),
                span: name.span,
            });
        }

        let instance = self.make_instance(&type_ref.name, type_ref.span)?;
        scope
            .borrow_mut()
            .define(&name.name, Value::Struct(instance), name.span)?;
        Ok(())
    }

    /// Build a fresh instance of the named type: a private, parentless field
    /// scope with every declared field (inherited fields included)
    /// default-initialized, and every method installed as a bound callable
    ///
    /// A field whose type names the type under construction (directly or
    /// through intermediate field types) is rejected; default-initializing it
    /// would never terminate.
    pub(crate) fn make_instance(
        &mut self,
        type_name: &str,
        span: Span,
    ) -> Result<StructInstance, RuntimeError> {
        let layout = self.layout_of(type_name, span)?;
        if self.instantiating.iter().any(|name| name == &layout.name) {
            return Err(RuntimeError::TypeMismatch {
                msg: format!("field cycle involving type '{}'", layout.name),
                span,
            });
        }
        self.instantiating.push(layout.name.clone());
        let instance = self.build_instance(&layout);
        self.instantiating.pop();
        instance
    }

    fn build_instance(&mut self, layout: &TypeLayout) -> Result<StructInstance, RuntimeError> {
        let fields = Scope::detached();

        for field in &layout.fields {
            let value = match &field.init {
                Some(init) => {
                    let value = self.eval_expr(init, &fields)?;
                    let value = self.check_declared_type(value, &field.type_ref, || {
                        format!("field '{}' of {}", field.name.name, layout.name)
                    })?;
                    value.deep_clone()
                }
                None => self.default_field_value(&field.type_ref)?,
            };
            fields
                .borrow_mut()
                .define(&field.name.name, value, field.span)?;
        }

        for method in layout.methods.values() {
            fields.borrow_mut().define(
                &method.name.name,
                Value::Function(FunctionRef::new(Rc::clone(method))),
                method.span,
            )?;
        }

        Ok(StructInstance {
            type_name: layout.name.clone(),
            fields,
        })
    }

    /// Zero value for a builtin field type; user-typed fields are nested
    /// instances, constructed recursively
    fn default_field_value(&mut self, type_ref: &TypeRef) -> Result<Value, RuntimeError> {
        let value = match type_ref.name.as_str() {
            "int" => Value::Int(0),
            "float" => Value::Float(0.0),
            "bool" => Value::Bool(false),
            "string" => Value::String(String::new()),
            "array" => Value::array(Vec::new()),
            name => Value::Struct(self.make_instance(name, type_ref.span)?),
        };
        Ok(value)
    }

    // === Imports ===

    pub(crate) fn exec_import(
        &mut self,
        import: &ImportDecl,
        scope: &ScopeRef,
    ) -> Result<(), RuntimeError> {
        match &import.kind {
            ImportKind::Module(name) => {
                // Importing the same module twice is a no-op
                if !self.loader.first_module_import(&name.name) {
                    return Ok(());
                }
                let natives =
                    stdlib::module(&name.name).ok_or_else(|| RuntimeError::ImportError {
                        msg: format!("unknown module <{}>", name.name),
                        span: name.span,
                    })?;
                for native in natives {
                    let binding_name = native.name.clone();
                    scope.borrow_mut().define(
                        &binding_name,
                        Value::NativeFunction(native),
                        import.span,
                    )?;
                }
            }
            ImportKind::File(path) => {
                // Each file is evaluated at most once
                if let Some(program) = self.loader.load_file(path, import.span)? {
                    self.eval(&program, scope)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    #[test]
    fn test_eval_literal() {
        let mut interp = Interpreter::new();
        let globals = Scope::global();
        let expr = Expr::Literal(Literal::Int(42), Span::dummy());
        assert_eq!(
            interp.eval_expr(&expr, &globals).unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn test_unknown_module_import() {
        let mut interp = Interpreter::new();
        let globals = Scope::global();
        let import = ImportDecl {
            kind: ImportKind::Module(Identifier {
                name: "nonsense".to_string(),
                span: Span::dummy(),
            }),
            span: Span::dummy(),
        };
        let result = interp.exec_import(&import, &globals);
        assert!(matches!(result, Err(RuntimeError::ImportError { .. })));
    }
}
