//! Scopes (environments)
//!
//! A Scope maps names to values and remembers, for every name, which scope
//! instance originally created the binding (its "creation scope"). Child
//! scopes snapshot the parent's whole binding table at construction, so a
//! lookup is a single local map hit instead of a parent-chain walk. The cost
//! is paid on update: writing a name whose creation scope is an ancestor must
//! route the new value through the live parent chain back to that ancestor,
//! refreshing each intermediate snapshot on the way.
//!
//! This read-heavy trade is deliberate: control-flow-heavy programs read
//! bindings many times per scope construction.

use crate::span::Span;
use crate::value::{RuntimeError, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope
///
/// Parent links, struct instance field scopes, and snapshots all hold the
/// same `Rc<RefCell<..>>` handle; the evaluator is single-threaded.
pub type ScopeRef = Rc<RefCell<Scope>>;

/// Identity of a scope instance, used to track creation scopes across
/// snapshot copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

fn next_scope_id() -> ScopeId {
    thread_local! {
        static NEXT: Cell<u64> = const { Cell::new(0) };
    }
    NEXT.with(|next| {
        let id = next.get();
        next.set(id + 1);
        ScopeId(id)
    })
}

/// A name's value plus the scope that created the binding
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    origin: ScopeId,
}

/// A chained environment with snapshot lookups and write-through updates
#[derive(Debug)]
pub struct Scope {
    id: ScopeId,
    parent: Option<ScopeRef>,
    bindings: HashMap<String, Binding>,
}

impl Scope {
    /// Create a root scope with no parent (the global scope)
    pub fn global() -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            id: next_scope_id(),
            parent: None,
            bindings: HashMap::new(),
        }))
    }

    /// Create a parentless scope for struct instance fields
    ///
    /// Identical to a global scope; the separate constructor marks intent at
    /// the call sites.
    pub fn detached() -> ScopeRef {
        Scope::global()
    }

    /// Create a child scope, snapshotting the parent's entire binding table
    /// (values and creation scopes) at construction time
    pub fn child_of(parent: &ScopeRef) -> ScopeRef {
        let bindings = parent.borrow().bindings.clone();
        Rc::new(RefCell::new(Scope {
            id: next_scope_id(),
            parent: Some(Rc::clone(parent)),
            bindings,
        }))
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Re-attach or detach this scope's parent link
    ///
    /// Used by method dispatch: an instance's field scope is parented to the
    /// calling scope for the duration of the call, then detached again. The
    /// snapshot table is untouched.
    pub fn set_parent(this: &ScopeRef, parent: Option<ScopeRef>) {
        this.borrow_mut().parent = parent;
    }

    /// Create a binding owned by this scope
    ///
    /// Fails with NameClash if this scope already created a binding for
    /// `name`. A binding merely inherited from a parent snapshot is shadowed:
    /// replaced locally with no effect on the ancestor's storage.
    pub fn define(&mut self, name: &str, value: Value, span: Span) -> Result<(), RuntimeError> {
        if let Some(existing) = self.bindings.get(name) {
            if existing.origin == self.id {
                return Err(RuntimeError::NameClash {
                    name: name.to_string(),
                    span,
                });
            }
        }
        self.bindings.insert(
            name.to_string(),
            Binding {
                value,
                origin: self.id,
            },
        );
        Ok(())
    }

    /// True only if this scope created the binding (distinguishes shadowing
    /// declarations from inherited visibility)
    pub fn is_defined_here(&self, name: &str) -> bool {
        self.bindings
            .get(name)
            .is_some_and(|binding| binding.origin == self.id)
    }

    /// Look up a name
    ///
    /// The local snapshot already contains everything inherited at
    /// construction time; the live parent chain is consulted only for
    /// bindings that became visible afterwards (a re-parented instance scope
    /// during a method call).
    pub fn lookup(this: &ScopeRef, name: &str, span: Span) -> Result<Value, RuntimeError> {
        Scope::try_lookup(this, name).ok_or_else(|| RuntimeError::UndefinedVariable {
            name: name.to_string(),
            span,
        })
    }

    fn try_lookup(this: &ScopeRef, name: &str) -> Option<Value> {
        if let Some(binding) = this.borrow().bindings.get(name) {
            return Some(binding.value.clone());
        }
        let parent = this.borrow().parent.clone();
        parent.and_then(|parent| Scope::try_lookup(&parent, name))
    }

    /// Update the value of an existing binding
    ///
    /// The new value must carry the same tag as the current one (a variable
    /// keeps its declared type for its whole lifetime). If the binding was
    /// created by an ancestor, the write is routed up the live parent chain
    /// into the creation scope's storage, and every snapshot along the way is
    /// refreshed so the current scope observes the new value immediately.
    pub fn update(
        this: &ScopeRef,
        name: &str,
        value: Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        let (origin, self_id, parent) = {
            let scope = this.borrow();
            match scope.bindings.get(name) {
                Some(binding) => {
                    if !binding.value.same_tag(&value) {
                        return Err(RuntimeError::TypeMismatch {
                            msg: format!(
                                "cannot assign {} to '{}' of type {}",
                                value.type_name(),
                                name,
                                binding.value.type_name()
                            ),
                            span,
                        });
                    }
                    (binding.origin, scope.id, scope.parent.clone())
                }
                None => {
                    // Visible only through the live chain (post-construction
                    // re-parenting); no local snapshot to refresh.
                    let parent = scope.parent.clone();
                    drop(scope);
                    return match parent {
                        Some(parent) => Scope::update(&parent, name, value, span),
                        None => Err(RuntimeError::UndefinedVariable {
                            name: name.to_string(),
                            span,
                        }),
                    };
                }
            }
        };

        if origin == self_id {
            let mut scope = this.borrow_mut();
            scope
                .bindings
                .get_mut(name)
                .expect("binding checked above")
                .value = value;
            return Ok(());
        }

        let parent = parent.ok_or_else(|| RuntimeError::UndefinedVariable {
            name: name.to_string(),
            span,
        })?;
        Scope::update(&parent, name, value.clone(), span)?;

        // Refresh the local snapshot for immediate consistency
        let mut scope = this.borrow_mut();
        scope
            .bindings
            .get_mut(name)
            .expect("binding checked above")
            .value = value;
        Ok(())
    }

    /// Independent copy of this scope with a fresh identity and no parent:
    /// every binding's value is deep-cloned and re-owned by the copy
    ///
    /// Used to clone struct instances.
    pub fn deep_clone_detached(this: &ScopeRef) -> ScopeRef {
        let copy = Scope::detached();
        let new_id = copy.borrow().id;
        {
            let source = this.borrow();
            let mut target = copy.borrow_mut();
            for (name, binding) in &source.bindings {
                target.bindings.insert(
                    name.clone(),
                    Binding {
                        value: binding.value.deep_clone(),
                        origin: new_id,
                    },
                );
            }
        }
        copy
    }

    /// Names of the bindings this scope itself created
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, binding)| binding.origin == self.id)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn define(scope: &ScopeRef, name: &str, value: Value) {
        scope
            .borrow_mut()
            .define(name, value, Span::dummy())
            .unwrap();
    }

    #[test]
    fn test_snapshot_lookup() {
        let global = Scope::global();
        define(&global, "x", Value::Int(1));
        let child = Scope::child_of(&global);
        assert_eq!(
            Scope::lookup(&child, "x", Span::dummy()).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn test_shadowing_leaves_parent_untouched() {
        let global = Scope::global();
        define(&global, "x", Value::Int(1));
        let child = Scope::child_of(&global);
        define(&child, "x", Value::Int(2));
        assert_eq!(
            Scope::lookup(&child, "x", Span::dummy()).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            Scope::lookup(&global, "x", Span::dummy()).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn test_name_clash_same_scope() {
        let global = Scope::global();
        define(&global, "x", Value::Int(1));
        let result = global
            .borrow_mut()
            .define("x", Value::Int(2), Span::dummy());
        assert!(matches!(result, Err(RuntimeError::NameClash { .. })));
    }

    #[test]
    fn test_write_through_reaches_creation_scope() {
        let global = Scope::global();
        define(&global, "x", Value::Int(1));
        let middle = Scope::child_of(&global);
        let inner = Scope::child_of(&middle);
        Scope::update(&inner, "x", Value::Int(9), Span::dummy()).unwrap();
        assert_eq!(
            Scope::lookup(&global, "x", Span::dummy()).unwrap(),
            Value::Int(9)
        );
        // Intermediate snapshot refreshed as well
        assert_eq!(
            Scope::lookup(&middle, "x", Span::dummy()).unwrap(),
            Value::Int(9)
        );
    }

    #[test]
    fn test_update_type_check() {
        let global = Scope::global();
        define(&global, "x", Value::Int(1));
        let result = Scope::update(&global, "x", Value::Float(1.5), Span::dummy());
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));
    }

    #[test]
    fn test_is_defined_here() {
        let global = Scope::global();
        define(&global, "x", Value::Int(1));
        let child = Scope::child_of(&global);
        assert!(global.borrow().is_defined_here("x"));
        assert!(!child.borrow().is_defined_here("x"));
        define(&child, "x", Value::Int(2));
        assert!(child.borrow().is_defined_here("x"));
    }
}
