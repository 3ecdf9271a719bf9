//! Code generation for the Weft template compiler.
//!
//! Two generators, layered:
//!
//! - [`string`]: turns one template string into a `{declarations,
//!   expression}` source pair, one parameterless closure per expression
//!   segment.
//! - [`tree`]: walks an archetype node tree, applies the string
//!   generator to every leaf payload and attribute value, and assembles
//!   a single source body that mutates an identically shaped instance
//!   tree in place, with a reference-aliasing optimization for compound
//!   reference expressions.
//!
//! Both return `Ok(None)` when there is nothing to compile; the only
//! error either can raise is the escape-token collision guard.

mod error;
pub mod string;
pub mod tree;

pub use error::GenError;
pub use string::{CodeFragment, ESCAPE_LABEL};
pub use tree::{NullSink, SegmentSink};
