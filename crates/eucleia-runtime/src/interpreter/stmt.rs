//! Statement execution

use crate::ast::*;
use crate::interpreter::{Flow, Interpreter, TypeDef};
use crate::scope::{Scope, ScopeRef};
use crate::value::{FunctionRef, RuntimeError, Value};
use std::rc::Rc;

impl Interpreter {
    /// Execute a statement, yielding the control-flow signal
    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt, scope: &ScopeRef) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::VarDecl(decl) => self.exec_var_decl(decl, scope),
            Stmt::Assign(assign) => self.exec_assign(assign, scope),
            Stmt::Expr(expr_stmt) => {
                self.eval_expr_opt(&expr_stmt.expr, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Block(block) => self.exec_block(block, scope),
            Stmt::If(if_stmt) => self.exec_if(if_stmt, scope),
            Stmt::While(while_stmt) => self.exec_while(while_stmt, scope),
            Stmt::DoWhile(do_while) => self.exec_do_while(do_while, scope),
            Stmt::For(for_stmt) => self.exec_for(for_stmt, scope),
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => Some(self.eval_expr(expr, scope)?),
                    None => None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Function(decl) => {
                let func = Value::Function(FunctionRef::new(Rc::new(decl.clone())));
                scope
                    .borrow_mut()
                    .define(&decl.name.name, func, decl.name.span)?;
                Ok(Flow::Normal)
            }
            Stmt::Struct(decl) => {
                self.register_type(&decl.name, TypeDef::Struct(Rc::new(decl.clone())))?;
                Ok(Flow::Normal)
            }
            Stmt::Class(decl) => {
                self.register_type(&decl.name, TypeDef::Class(Rc::new(decl.clone())))?;
                Ok(Flow::Normal)
            }
            Stmt::Import(import) => {
                self.exec_import(import, scope)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn register_type(&mut self, name: &Identifier, def: TypeDef) -> Result<(), RuntimeError> {
        if self.types.contains_key(&name.name) {
            return Err(RuntimeError::DoubleInstantiation {
                msg: format!("type '{}' is already defined", name.name),
                span: name.span,
            });
        }
        self.types.insert(name.name.clone(), def);
        Ok(())
    }

    /// Variable declaration
    ///
    /// Builtin-typed declarations bind a (default- or expression-)initialized
    /// value. A declaration whose name this scope already owns re-uses the
    /// binding as a type-checked overwrite — that is what makes declarations
    /// inside a shared loop scope behave as one mutable binding across
    /// iterations. User-typed declarations are struct/class instantiation
    /// (or, with an initializer, an explicit deep copy of another instance).
    fn exec_var_decl(&mut self, decl: &VarDecl, scope: &ScopeRef) -> Result<Flow, RuntimeError> {
        if decl.type_ref.is_builtin() {
            let value = match &decl.init {
                Some(init) => {
                    let value = self.eval_expr(init, scope)?;
                    let value = self.check_declared_type(value, &decl.type_ref, || {
                        format!("variable '{}'", decl.name.name)
                    })?;
                    value.deep_clone()
                }
                None => default_value(&decl.type_ref),
            };
            self.bind(scope, &decl.name, value)?;
        } else {
            match &decl.init {
                // `Point q = p;` — deep copy of an existing instance
                Some(init) => {
                    let value = self.eval_expr(init, scope)?;
                    let value = self.check_declared_type(value, &decl.type_ref, || {
                        format!("variable '{}'", decl.name.name)
                    })?;
                    self.bind(scope, &decl.name, value.deep_clone())?;
                }
                // `Point p;` — one-shot instantiation
                None => self.instantiate(&decl.type_ref, &decl.name, scope)?,
            }
        }
        Ok(Flow::Normal)
    }

    /// Define, or overwrite a binding this scope already owns
    fn bind(&mut self, scope: &ScopeRef, name: &Identifier, value: Value) -> Result<(), RuntimeError> {
        if scope.borrow().is_defined_here(&name.name) {
            Scope::update(scope, &name.name, value, name.span)
        } else {
            scope.borrow_mut().define(&name.name, value, name.span)
        }
    }

    /// Assignment
    ///
    /// Variable targets deep-clone the value and route through the
    /// write-through update. Index and member targets are the deliberate
    /// exception to clone-on-copy: they replace the slot in place so
    /// container/instance internals are mutable through the handle.
    fn exec_assign(&mut self, assign: &Assign, scope: &ScopeRef) -> Result<Flow, RuntimeError> {
        let value = self.eval_expr(&assign.value, scope)?;

        match &assign.target {
            AssignTarget::Name(name) => {
                Scope::update(scope, &name.name, value.deep_clone(), name.span)?;
            }
            AssignTarget::Index {
                target,
                index,
                span,
            } => {
                let array_value = Scope::lookup(scope, &target.name, target.span)?;
                let array = array_value.as_array(target.span)?;
                let index_value = self.eval_expr(index, scope)?;
                let index = index_value.as_int(index.span())?;
                let current = array_index(array, index, *span)?;
                if !current.same_tag(&value) {
                    return Err(RuntimeError::TypeMismatch {
                        msg: format!(
                            "cannot assign {} to array element of type {}",
                            value.type_name(),
                            current.type_name()
                        ),
                        span: *span,
                    });
                }
                array.set(index as usize, value.deep_clone());
            }
            AssignTarget::Member {
                target,
                field,
                span,
            } => {
                let instance_value = Scope::lookup(scope, &target.name, target.span)?;
                let instance = instance_value.as_struct(target.span)?;
                Scope::update(&instance.fields, &field.name, value.deep_clone(), *span)?;
            }
        }

        Ok(Flow::Normal)
    }

    /// Block: one child scope for the whole sequence, dropped on exit
    pub(crate) fn exec_block(&mut self, block: &Block, scope: &ScopeRef) -> Result<Flow, RuntimeError> {
        let inner = Scope::child_of(scope);
        for stmt in &block.stmts {
            match self.exec_stmt(stmt, &inner)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// If: the condition runs in a short-lived child scope so its temporaries
    /// do not leak; the taken branch is an ordinary block
    fn exec_if(&mut self, if_stmt: &IfStmt, scope: &ScopeRef) -> Result<Flow, RuntimeError> {
        let condition = self.eval_condition(&if_stmt.condition, scope)?;
        if condition {
            self.exec_block(&if_stmt.then_block, scope)
        } else {
            match &if_stmt.else_branch {
                Some(ElseBranch::Else(block)) => self.exec_block(block, scope),
                Some(ElseBranch::ElseIf(nested)) => self.exec_if(nested, scope),
                None => Ok(Flow::Normal),
            }
        }
    }

    fn eval_condition(&mut self, condition: &Expr, scope: &ScopeRef) -> Result<bool, RuntimeError> {
        let cond_scope = Scope::child_of(scope);
        let value = self.eval_expr(condition, &cond_scope)?;
        value.as_bool(condition.span())
    }

    /// While: one loop scope persists across all iterations; the body runs
    /// directly in it (no fresh scope per iteration), the condition in a
    /// short-lived child per iteration
    fn exec_while(&mut self, while_stmt: &WhileStmt, scope: &ScopeRef) -> Result<Flow, RuntimeError> {
        let loop_scope = Scope::child_of(scope);
        loop {
            if !self.eval_condition(&while_stmt.condition, &loop_scope)? {
                break;
            }
            match self.exec_loop_body(&while_stmt.body, &loop_scope)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal => {}
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_do_while(
        &mut self,
        do_while: &DoWhileStmt,
        scope: &ScopeRef,
    ) -> Result<Flow, RuntimeError> {
        let loop_scope = Scope::child_of(scope);
        loop {
            match self.exec_loop_body(&do_while.body, &loop_scope)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal => {}
            }
            if !self.eval_condition(&do_while.condition, &loop_scope)? {
                break;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(&mut self, for_stmt: &ForStmt, scope: &ScopeRef) -> Result<Flow, RuntimeError> {
        let loop_scope = Scope::child_of(scope);

        match self.exec_stmt(&for_stmt.init, &loop_scope)? {
            Flow::Normal => {}
            flow => return Ok(flow),
        }

        loop {
            if !self.eval_condition(&for_stmt.condition, &loop_scope)? {
                break;
            }
            match self.exec_loop_body(&for_stmt.body, &loop_scope)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal => {}
            }
            match self.exec_stmt(&for_stmt.step, &loop_scope)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run loop-body statements in the shared loop scope, stopping at the
    /// first break/return signal
    fn exec_loop_body(&mut self, body: &Block, loop_scope: &ScopeRef) -> Result<Flow, RuntimeError> {
        for stmt in &body.stmts {
            match self.exec_stmt(stmt, loop_scope)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }
}

/// Zero value for a builtin declared type
fn default_value(type_ref: &TypeRef) -> Value {
    match type_ref.name.as_str() {
        "int" => Value::Int(0),
        "float" => Value::Float(0.0),
        "bool" => Value::Bool(false),
        "string" => Value::String(String::new()),
        _ => Value::array(Vec::new()),
    }
}

/// Bounds-checked array element read
pub(crate) fn array_index(
    array: &crate::value::ValueArray,
    index: i64,
    span: crate::span::Span,
) -> Result<Value, RuntimeError> {
    if index < 0 || index as usize >= array.len() {
        return Err(RuntimeError::IndexOutOfBounds {
            index,
            len: array.len(),
            span,
        });
    }
    Ok(array.get(index as usize).expect("index checked above"))
}
