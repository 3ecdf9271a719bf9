//! Node-tree model for the Weft template compiler.
//!
//! Two trees take part in a compile: the *archetype* tree scanned for
//! template expressions at compile time, and the *instance* tree mutated
//! when a compiled callable is applied. Both share this representation;
//! an instance is normally produced with [`NodeRef::deep_clone`].
//!
//! Nodes are a two-variant tagged union: a *leaf* holds a single mutable
//! textual payload, a *branch* holds ordered named attributes and ordered
//! children. A branch may be flagged *opaque*, which stops the compiler
//! from scanning its children (attributes are still scanned).

mod node;

pub use node::{LeafKind, NodeRef};
