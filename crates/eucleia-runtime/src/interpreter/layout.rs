//! Merged struct/class layouts
//!
//! A type's layout is its full field list and method table after walking the
//! single-inheritance chain: parent fields first, child fields appended, with
//! a duplicate field name being an error while a duplicate method name is an
//! intentional override. Layouts are memoized per type name, so the merge
//! runs once no matter how many instances are created.

use crate::ast::{FieldDecl, FunctionDecl};
use crate::interpreter::{Interpreter, TypeDef};
use crate::span::Span;
use crate::value::RuntimeError;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Merged field and method tables for one struct/class type
#[derive(Debug)]
pub(crate) struct TypeLayout {
    pub(crate) name: String,
    /// Parent-first field order
    pub(crate) fields: Vec<FieldDecl>,
    /// Method table, child definitions overriding parent ones by name
    pub(crate) methods: HashMap<String, Rc<FunctionDecl>>,
}

impl Interpreter {
    /// Resolve (and memoize) the merged layout for `type_name`
    pub(crate) fn layout_of(
        &mut self,
        type_name: &str,
        span: Span,
    ) -> Result<Rc<TypeLayout>, RuntimeError> {
        let mut visiting = HashSet::new();
        self.build_layout(type_name, span, &mut visiting)
    }

    fn build_layout(
        &mut self,
        type_name: &str,
        span: Span,
        visiting: &mut HashSet<String>,
    ) -> Result<Rc<TypeLayout>, RuntimeError> {
        if let Some(layout) = self.layouts.get(type_name) {
            return Ok(Rc::clone(layout));
        }
        if !visiting.insert(type_name.to_string()) {
            return Err(RuntimeError::TypeMismatch {
                msg: format!("inheritance cycle involving type '{}'", type_name),
                span,
            });
        }

        let def = self
            .types
            .get(type_name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownType {
                name: type_name.to_string(),
                span,
            })?;

        let (parent, own_fields, own_methods) = match &def {
            TypeDef::Struct(decl) => (decl.parent.clone(), decl.fields.clone(), Vec::new()),
            TypeDef::Class(decl) => (
                decl.parent.clone(),
                decl.fields.clone(),
                decl.methods.clone(),
            ),
        };

        let (mut fields, mut methods) = match &parent {
            Some(parent_name) => {
                let parent_layout =
                    self.build_layout(&parent_name.name, parent_name.span, visiting)?;
                (parent_layout.fields.clone(), parent_layout.methods.clone())
            }
            None => (Vec::new(), HashMap::new()),
        };

        for field in own_fields {
            if fields.iter().any(|f| f.name.name == field.name.name) {
                return Err(RuntimeError::NameClash {
                    name: field.name.name.clone(),
                    span: field.span,
                });
            }
            fields.push(field);
        }

        for method in own_methods {
            methods.insert(method.name.name.clone(), Rc::new(method));
        }

        let layout = Rc::new(TypeLayout {
            name: type_name.to_string(),
            fields,
            methods,
        });
        self.layouts.insert(type_name.to_string(), Rc::clone(&layout));
        Ok(layout)
    }
}
