//! Host code-execution collaborator for the Weft compiler.
//!
//! The code generators in `weft_codegen` emit textual source; something
//! has to turn that text into a callable. This crate is that something:
//! a small expression/statement language with a logos lexer, a recursive
//! descent parser, and a tree-walking evaluator over a scope chain.
//!
//! The seam is the [`Host`] trait: given source text, a parameter-name
//! list, and an ordered [`Closure`] of free-variable bindings, a host
//! either returns a working [`Callable`] or raises a [`SyntaxError`].
//! Runtime faults at call time are the distinct [`EvalError`] type, so
//! callers can always tell a compile-shaped fault from an evaluation
//! fault. [`Engine`] is the built-in implementation.
//!
//! Closure bindings are captured by value when a callable is built;
//! mutating the original [`Closure`] afterwards does not affect
//! already-compiled callables.

mod ast;
mod closure;
mod env;
mod error;
mod host;
mod interp;
mod lexer;
mod parser;
mod value;

pub use closure::Closure;
pub use error::{EvalError, SyntaxError};
pub use host::{Callable, Engine, Host};
pub use value::{NativeFn, Value};
