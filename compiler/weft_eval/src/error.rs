//! Error types for the host language.
//!
//! Two disjoint families, per the compiler's contract: [`SyntaxError`]
//! for anything raised while turning source text into a callable, and
//! [`EvalError`] for anything raised while running one. The compile and
//! diagnose layers rely on the distinction — only syntax faults are
//! localizable to a template segment.

use thiserror::Error;

/// A fault raised while lexing or parsing host source.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("syntax error at offset {offset}: {message}")]
pub struct SyntaxError {
    /// Human-readable description of the fault.
    pub message: String,
    /// Byte offset into the compiled source where the fault was noticed.
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        SyntaxError {
            message: message.into(),
            offset,
        }
    }
}

/// A fault raised while evaluating a compiled callable.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },

    #[error("cannot assign to undefined variable `{name}`")]
    UndefinedAssignment { name: String },

    #[error("`{type_name}` is not callable")]
    NotCallable { type_name: &'static str },

    #[error("no member `{member}` on `{type_name}`")]
    NoSuchMember {
        member: String,
        type_name: &'static str,
    },

    #[error("no method `{method}` on `{type_name}`")]
    NoSuchMethod {
        method: String,
        type_name: &'static str,
    },

    #[error("`{method}` expects {expected} arguments, got {got}")]
    ArityMismatch {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("cannot index `{type_name}`")]
    CannotIndex { type_name: &'static str },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("invalid operands for `{op}`: `{left}` and `{right}`")]
    InvalidBinaryOp {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("invalid operand for unary `{op}`: `{type_name}`")]
    InvalidUnaryOp {
        op: &'static str,
        type_name: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in `{op}`")]
    Overflow { op: &'static str },

    #[error("condition must be `bool`, got `{type_name}`")]
    NonBoolCondition { type_name: &'static str },

    #[error("cannot assign member `{member}` on `{type_name}`")]
    InvalidAssignment {
        member: String,
        type_name: &'static str,
    },

    #[error("`break` escaped its enclosing callable")]
    UnmatchedBreak { label: Option<String> },

    #[error("{message}")]
    Native { message: String },
}

impl EvalError {
    /// Error constructor for native functions injected through a closure.
    pub fn native(message: impl Into<String>) -> Self {
        EvalError::Native {
            message: message.into(),
        }
    }
}
