//! The code-execution seam between the compiler and the evaluator.
//!
//! The compile layer never runs code itself: it hands generated source,
//! a parameter list, and a closure to a [`Host`] and gets back a
//! [`Callable`] or a [`SyntaxError`]. [`Engine`] is the built-in host;
//! tests substitute their own implementations to probe failure paths.

use std::rc::Rc;

use crate::closure::Closure;
use crate::env::{LocalScope, Scope};
use crate::error::{EvalError, SyntaxError};
use crate::interp::Interpreter;
use crate::parser::parse;
use crate::value::{ProgramBody, Value};

/// A code-execution collaborator: turns source text into a callable or
/// raises a syntax-level fault.
pub trait Host {
    /// Compile `source` (a statement list) into a callable.
    ///
    /// `params` become the callable's positional parameters; the
    /// closure's bindings are captured by value and visible as free
    /// variables inside the source.
    fn compile(
        &self,
        source: &str,
        params: &[String],
        closure: &Closure,
    ) -> Result<Callable, SyntaxError>;
}

/// The built-in host: lexes, parses, and later tree-walks the source.
#[derive(Clone, Copy, Debug, Default)]
pub struct Engine;

impl Host for Engine {
    fn compile(
        &self,
        source: &str,
        params: &[String],
        closure: &Closure,
    ) -> Result<Callable, SyntaxError> {
        for param in params {
            check_identifier(param, "parameter")?;
        }
        for (name, _) in closure.bindings() {
            check_identifier(name, "closure binding")?;
        }
        let body: ProgramBody = Rc::new(parse(source)?);
        Ok(Callable {
            params: params.to_vec(),
            body,
            captured: closure.bindings().to_vec(),
        })
    }
}

/// A compiled unit: frozen closure bindings, a parameter list, and a
/// parsed body.
///
/// Each call builds a fresh scope chain, so one callable can be applied
/// any number of times; only mutations it performs through `Node`
/// arguments outlive a call.
#[derive(Debug)]
pub struct Callable {
    params: Vec<String>,
    body: ProgramBody,
    captured: Vec<(String, Value)>,
}

impl Callable {
    /// Invoke with positional arguments bound to the parameter list.
    /// Missing arguments bind as `Unit`.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        let captured = LocalScope::new(Scope::new());
        for (name, value) in &self.captured {
            captured.borrow_mut().define(name.clone(), value.clone());
        }
        let frame = LocalScope::new(Scope::with_parent(captured));
        for (i, param) in self.params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(Value::Unit);
            frame.borrow_mut().define(param.clone(), value);
        }
        Interpreter.run_body(&self.body, &frame)
    }
}

const KEYWORDS: &[&str] = &["let", "if", "else", "return", "break", "true", "false"];

fn check_identifier(name: &str, role: &str) -> Result<(), SyntaxError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !KEYWORDS.contains(&name)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SyntaxError::new(
            format!("invalid {role} name `{name}`"),
            0,
        ))
    }
}
