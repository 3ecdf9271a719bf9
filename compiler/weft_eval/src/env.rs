//! Variable scoping for the host evaluator.
//!
//! A scope chain of reference-counted frames, the same shape the
//! evaluator is used in everywhere else: single-threaded, so `Rc` over
//! `Arc`. Arrow functions keep their defining frame alive by cloning
//! the handle.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::EvalError;
use crate::value::Value;

/// Single-threaded shared handle to a scope frame.
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

impl<T> Clone for LocalScope<T> {
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

/// One frame of bindings with an optional parent.
pub struct Scope {
    bindings: FxHashMap<String, Value>,
    parent: Option<LocalScope<Scope>>,
}

impl Scope {
    /// A root frame.
    pub fn new() -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: None,
        }
    }

    /// A child frame.
    pub fn with_parent(parent: LocalScope<Scope>) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    /// Bind a name in this frame. Rebinding an existing name shadows the
    /// old value; generated code leans on this when per-node declaration
    /// prefixes repeat across sibling subtrees.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Look a name up through the chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.borrow().lookup(name))
    }

    /// Reassign an existing binding, wherever in the chain it lives.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        if let Some(slot) = self.bindings.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(EvalError::UndefinedAssignment {
                name: name.to_string(),
            }),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_walks_the_chain() {
        let root = LocalScope::new(Scope::new());
        root.borrow_mut().define("a", Value::int(1));
        let child = Scope::with_parent(root.clone());
        assert_eq!(child.lookup("a"), Some(Value::int(1)));
        assert_eq!(child.lookup("b"), None);
    }

    #[test]
    fn child_shadows_parent() {
        let root = LocalScope::new(Scope::new());
        root.borrow_mut().define("a", Value::int(1));
        let mut child = Scope::with_parent(root.clone());
        child.define("a", Value::int(2));
        assert_eq!(child.lookup("a"), Some(Value::int(2)));
        assert_eq!(root.borrow().lookup("a"), Some(Value::int(1)));
    }

    #[test]
    fn rebinding_in_one_frame_is_allowed() {
        let mut scope = Scope::new();
        scope.define("x", Value::int(1));
        scope.define("x", Value::int(2));
        assert_eq!(scope.lookup("x"), Some(Value::int(2)));
    }

    #[test]
    fn assign_reaches_outer_frames() {
        let root = LocalScope::new(Scope::new());
        root.borrow_mut().define("a", Value::int(1));
        let child = LocalScope::new(Scope::with_parent(root.clone()));
        child.borrow_mut().assign("a", Value::int(5)).unwrap();
        assert_eq!(root.borrow().lookup("a"), Some(Value::int(5)));

        let err = child.borrow_mut().assign("missing", Value::Unit);
        assert!(err.is_err());
    }
}
