//! Diagnostics for template compilation.
//!
//! A [`Diagnostic`] ties one compilation fault to the place in the
//! archetype tree it came from. Attribute and data faults carry a
//! CSS-flavored selector path so the offending node can be named in a
//! message without holding the tree; the node handle itself rides
//! along for programmatic consumers.

use std::fmt;

use thiserror::Error;
use weft_eval::SyntaxError;
use weft_tree::NodeRef;

/// One fault found while probing an archetype tree.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Diagnostic {
    /// An attribute value failed string compilation.
    #[error("in attribute `{attr}` of {selector}: {error}")]
    Attr {
        selector: String,
        node: NodeRef,
        attr: String,
        error: SyntaxError,
    },
    /// A leaf payload failed string compilation.
    #[error("in data of {selector}: {error}")]
    Data {
        selector: String,
        node: NodeRef,
        error: SyntaxError,
    },
    /// The aggregate body failed even though every individual segment
    /// compiled; the fault lies with the surrounding generated code,
    /// not with any one template string.
    #[error("in generated code: {error}")]
    Engine { error: SyntaxError },
}

impl Diagnostic {
    /// The underlying syntax fault.
    pub fn error(&self) -> &SyntaxError {
        match self {
            Diagnostic::Attr { error, .. }
            | Diagnostic::Data { error, .. }
            | Diagnostic::Engine { error } => error,
        }
    }
}

/// Selector path from `root` down to `node`, outermost step first.
///
/// Branches are addressed as `tag:nth-child(i)` with `i` counted among
/// branch siblings only; leaves as `kind[i]` with `i` counted among all
/// siblings. Steps join with `" > "`; the root contributes `tag:root`
/// (or `kind:root` for a leaf root). The walk stops early if `node` is
/// detached from `root`, producing a path relative to the nearest
/// ancestor that has no parent.
pub fn selector_of(node: &NodeRef, root: &NodeRef) -> String {
    let mut steps: Vec<String> = Vec::new();
    let mut cursor = node.clone();
    while cursor != *root {
        let Some(parent) = cursor.parent() else {
            break;
        };
        steps.push(step_of(&cursor));
        cursor = parent;
    }
    steps.push(format!("{}:root", name_of(&cursor)));
    steps.reverse();
    steps.join(" > ")
}

fn step_of(node: &NodeRef) -> String {
    match node.leaf_kind() {
        Some(kind) => format!("{kind}[{}]", node.index_in_parent().unwrap_or(0)),
        None => format!(
            "{}:nth-child({})",
            name_of(node),
            node.branch_index_in_parent().unwrap_or(0)
        ),
    }
}

fn name_of(node: &NodeRef) -> String {
    match node.leaf_kind() {
        Some(kind) => kind.to_string(),
        None => node.tag().unwrap_or_default(),
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Attr => "attr",
            DiagnosticKind::Data => "data",
            DiagnosticKind::Engine => "engine",
        })
    }
}

/// Discriminant of a [`Diagnostic`], for reporting and filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    Attr,
    Data,
    Engine,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::Attr { .. } => DiagnosticKind::Attr,
            Diagnostic::Data { .. } => DiagnosticKind::Data,
            Diagnostic::Engine { .. } => DiagnosticKind::Engine,
        }
    }
}
