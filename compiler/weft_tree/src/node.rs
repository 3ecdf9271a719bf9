//! Reference-counted tree nodes with interior mutability.
//!
//! `NodeRef` wraps `Rc<RefCell<NodeData>>`, single-threaded by design:
//! a compile or apply call never crosses a thread boundary, so `Rc` is
//! the right tool (the same trade-off the scope chain in `weft_eval`
//! makes). Parent links are `Weak` to keep the tree acyclic for the
//! reference counter.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Kind label for leaf nodes, used by diagnostic selector paths.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LeafKind {
    /// Plain character data.
    Text,
    /// Comment character data. Scanned for expressions like text.
    Comment,
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafKind::Text => write!(f, "text"),
            LeafKind::Comment => write!(f, "comment"),
        }
    }
}

enum NodeKind {
    Leaf {
        kind: LeafKind,
        data: String,
    },
    Branch {
        tag: String,
        opaque: bool,
        /// Attribute order is definition order; `set_attr` on a new name
        /// appends.
        attrs: Vec<(String, String)>,
        children: Vec<NodeRef>,
    },
}

struct NodeData {
    parent: Weak<RefCell<NodeData>>,
    kind: NodeKind,
}

/// Shared handle to one tree node.
///
/// Cloning a `NodeRef` clones the handle, not the node; equality is
/// node identity. Use [`NodeRef::deep_clone`] for a structural copy.
pub struct NodeRef(Rc<RefCell<NodeData>>);

impl Clone for NodeRef {
    fn clone(&self) -> Self {
        NodeRef(Rc::clone(&self.0))
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl NodeRef {
    fn new(kind: NodeKind) -> Self {
        NodeRef(Rc::new(RefCell::new(NodeData {
            parent: Weak::new(),
            kind,
        })))
    }

    /// Create a text leaf.
    pub fn text(data: impl Into<String>) -> Self {
        NodeRef::new(NodeKind::Leaf {
            kind: LeafKind::Text,
            data: data.into(),
        })
    }

    /// Create a comment leaf.
    pub fn comment(data: impl Into<String>) -> Self {
        NodeRef::new(NodeKind::Leaf {
            kind: LeafKind::Comment,
            data: data.into(),
        })
    }

    /// Create a branch node.
    pub fn branch(tag: impl Into<String>) -> Self {
        NodeRef::new(NodeKind::Branch {
            tag: tag.into(),
            opaque: false,
            attrs: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Create an opaque branch: its attributes are scanned for template
    /// expressions but its children are not.
    pub fn opaque_branch(tag: impl Into<String>) -> Self {
        NodeRef::new(NodeKind::Branch {
            tag: tag.into(),
            opaque: true,
            attrs: Vec::new(),
            children: Vec::new(),
        })
    }

    /// `true` for text and comment nodes.
    pub fn is_leaf(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Leaf { .. })
    }

    /// `true` for branches whose children must not be scanned.
    pub fn is_opaque(&self) -> bool {
        matches!(
            self.0.borrow().kind,
            NodeKind::Branch { opaque: true, .. }
        )
    }

    /// Leaf kind label, `None` for branches.
    pub fn leaf_kind(&self) -> Option<LeafKind> {
        match self.0.borrow().kind {
            NodeKind::Leaf { kind, .. } => Some(kind),
            NodeKind::Branch { .. } => None,
        }
    }

    /// Leaf payload, `None` for branches.
    pub fn data(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Leaf { data, .. } => Some(data.clone()),
            NodeKind::Branch { .. } => None,
        }
    }

    /// Replace a leaf payload. Returns `false` on a branch.
    pub fn set_data(&self, value: impl Into<String>) -> bool {
        match &mut self.0.borrow_mut().kind {
            NodeKind::Leaf { data, .. } => {
                *data = value.into();
                true
            }
            NodeKind::Branch { .. } => false,
        }
    }

    /// Branch tag, `None` for leaves.
    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Branch { tag, .. } => Some(tag.clone()),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Attribute names in definition order. Empty for leaves.
    pub fn attr_names(&self) -> Vec<String> {
        match &self.0.borrow().kind {
            NodeKind::Branch { attrs, .. } => {
                attrs.iter().map(|(name, _)| name.clone()).collect()
            }
            NodeKind::Leaf { .. } => Vec::new(),
        }
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Branch { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Set an attribute, appending the name if it is new. Returns `false`
    /// on a leaf.
    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        match &mut self.0.borrow_mut().kind {
            NodeKind::Branch { attrs, .. } => {
                let value = value.into();
                if let Some(slot) = attrs.iter_mut().find(|(n, _)| *n == name) {
                    slot.1 = value;
                } else {
                    attrs.push((name, value));
                }
                true
            }
            NodeKind::Leaf { .. } => false,
        }
    }

    /// Append a child, reparenting it to `self`. Returns `false` on a
    /// leaf.
    pub fn append(&self, child: &NodeRef) -> bool {
        match &mut self.0.borrow_mut().kind {
            NodeKind::Branch { children, .. } => {
                child.0.borrow_mut().parent = Rc::downgrade(&self.0);
                children.push(child.clone());
                true
            }
            NodeKind::Leaf { .. } => false,
        }
    }

    /// Children handles in order. Empty for leaves.
    pub fn children(&self) -> Vec<NodeRef> {
        match &self.0.borrow().kind {
            NodeKind::Branch { children, .. } => children.clone(),
            NodeKind::Leaf { .. } => Vec::new(),
        }
    }

    /// Child handle by index.
    pub fn child(&self, index: usize) -> Option<NodeRef> {
        match &self.0.borrow().kind {
            NodeKind::Branch { children, .. } => children.get(index).cloned(),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Parent handle, `None` for a root (or a detached node).
    pub fn parent(&self) -> Option<NodeRef> {
        self.0.borrow().parent.upgrade().map(NodeRef)
    }

    /// Position among the parent's children, counting every sibling.
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent.children().iter().position(|c| c == self)
    }

    /// Position among the parent's *branch* children only. `None` for
    /// leaves and roots.
    pub fn branch_index_in_parent(&self) -> Option<usize> {
        if self.is_leaf() {
            return None;
        }
        let parent = self.parent()?;
        parent
            .children()
            .iter()
            .filter(|c| !c.is_leaf())
            .position(|c| c == self)
    }

    /// Structural copy of this subtree. The copy's root has no parent.
    pub fn deep_clone(&self) -> NodeRef {
        let copy = match &self.0.borrow().kind {
            NodeKind::Leaf { kind, data } => NodeRef::new(NodeKind::Leaf {
                kind: *kind,
                data: data.clone(),
            }),
            NodeKind::Branch {
                tag,
                opaque,
                attrs,
                children,
            } => {
                let branch = NodeRef::new(NodeKind::Branch {
                    tag: tag.clone(),
                    opaque: *opaque,
                    attrs: attrs.clone(),
                    children: Vec::new(),
                });
                for child in children {
                    branch.append(&child.deep_clone());
                }
                branch
            }
        };
        copy
    }

    /// Chainable [`NodeRef::set_attr`], for building archetypes in tests.
    pub fn with_attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Chainable [`NodeRef::append`].
    pub fn with_child(self, child: NodeRef) -> Self {
        self.append(&child);
        self
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.borrow().kind {
            NodeKind::Leaf { kind, data } => {
                write!(f, "{kind}({data:?})")
            }
            NodeKind::Branch {
                tag,
                opaque,
                attrs,
                children,
            } => {
                let mut dbg = f.debug_struct(tag);
                if *opaque {
                    dbg.field("opaque", opaque);
                }
                for (name, value) in attrs {
                    dbg.field(name, value);
                }
                dbg.field("children", children);
                dbg.finish()
            }
        }
    }
}
