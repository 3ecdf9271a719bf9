//! Ordered free-variable bindings for compiled callables.

use crate::value::Value;

/// An ordered name→value mapping injected into a callable's captured
/// scope at compile time.
///
/// Order is insertion order. Compiling clones the bindings, so mutating
/// a `Closure` after a compile does not affect callables already built
/// from it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Closure {
    bindings: Vec<(String, Value)>,
}

impl Closure {
    pub fn new() -> Self {
        Closure::default()
    }

    /// Bind a name, replacing an existing binding in place (keeping its
    /// original position) or appending a new one.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        let name = name.into();
        if let Some(slot) = self.bindings.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.bindings.push((name, value));
        }
        self
    }

    /// Chainable [`Closure::set`].
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The bindings in insertion order.
    pub fn bindings(&self) -> &[(String, Value)] {
        &self.bindings
    }
}

impl FromIterator<(String, Value)> for Closure {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut closure = Closure::new();
        for (name, value) in iter {
            closure.set(name, value);
        }
        closure
    }
}
