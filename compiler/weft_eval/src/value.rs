//! Runtime values for the host evaluator.

use std::fmt;
use std::rc::Rc;

use weft_tree::NodeRef;

use crate::ast::{ArrowBody, Block};
use crate::env::{LocalScope, Scope};
use crate::error::EvalError;

/// A host function injected through a closure binding.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// Runtime value in the host evaluator.
///
/// Cloning is cheap: heap-backed variants share their payload.
#[derive(Clone)]
pub enum Value {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// The absent value. Stringifies to the empty string, so a template
    /// segment that produces nothing contributes nothing to the output.
    Unit,
    /// A handle into an instance tree.
    Node(NodeRef),
    List(Rc<Vec<Value>>),
    /// A host-language arrow function with its captured scope.
    Func(Rc<FunctionValue>),
    /// A caller-supplied Rust function.
    Native(NativeFn),
}

/// An arrow function value: parameters, body, and the scope it closed
/// over.
pub struct FunctionValue {
    pub params: Vec<String>,
    pub body: ArrowBody,
    pub captured: LocalScope<Scope>,
}

/// A callable body for [`crate::Callable`]: a statement list.
pub type ProgramBody = Rc<Block>;

impl Value {
    /// Create a string value.
    pub fn string(value: impl Into<Rc<str>>) -> Self {
        Value::Str(value.into())
    }

    /// Create an integer value.
    pub fn int(value: i64) -> Self {
        Value::Int(value)
    }

    /// Create a native-function value.
    pub fn native(f: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static) -> Self {
        Value::Native(Rc::new(f))
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Unit => "unit",
            Value::Node(node) => {
                if node.is_leaf() {
                    "leaf node"
                } else {
                    "branch node"
                }
            }
            Value::List(_) => "list",
            Value::Func(_) => "function",
            Value::Native(_) => "function",
        }
    }

    /// The textual form written into leaf payloads and attributes.
    ///
    /// `Str` is verbatim, `Unit` is empty, everything else uses its
    /// `Display` form.
    pub fn stringify(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Unit => Ok(()),
            Value::Node(node) => {
                if let Some(tag) = node.tag() {
                    write!(f, "[node {tag}]")
                } else {
                    write!(f, "[node]")
                }
            }
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Func(_) | Value::Native(_) => write!(f, "[function]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Unit => write!(f, "Unit"),
            Value::Node(node) => write!(f, "Node({node:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Func(_) => write!(f, "Func(..)"),
            Value::Native(_) => write!(f, "Native(..)"),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for data, identity for nodes and functions.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                #[allow(clippy::cast_precision_loss)]
                let promoted = *a as f64;
                promoted == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stringify_forms() {
        assert_eq!(Value::string("a}b").stringify(), "a}b");
        assert_eq!(Value::int(7).stringify(), "7");
        assert_eq!(Value::Unit.stringify(), "");
        assert_eq!(Value::Bool(true).stringify(), "true");
    }

    #[test]
    fn node_equality_is_identity() {
        let a = weft_tree::NodeRef::text("x");
        let b = weft_tree::NodeRef::text("x");
        assert_eq!(Value::Node(a.clone()), Value::Node(a.clone()));
        assert!(Value::Node(a) != Value::Node(b));
    }

    #[test]
    fn mixed_numeric_equality() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert!(Value::Int(2) != Value::Float(2.5));
    }
}
