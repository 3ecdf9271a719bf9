//! Tree-level code generator.
//!
//! Depth-first, pre-order walk over an archetype tree. Every leaf
//! payload and every attribute value goes through the string generator;
//! successful fragments become a per-node closure declaration plus a
//! mutation line against the instance tree:
//!
//! ```text
//! let _text = (target) => "foo " + _text_4();
//! fragment.children[0].data = _text(fragment.children[0]);
//! ```
//!
//! A node's *reference* is the expression locating its instance
//! counterpart. How it is emitted depends on how often it is used:
//! zero uses emit nothing (the subtree propagates `None` upward), one
//! use inlines the raw reference, and multiple uses — when the caller
//! allows aliasing — bind it once to a block-scoped local so a compound
//! chain like `fragment.children[2].children[0]` is not re-evaluated
//! per use. Children are always alias-eligible since their access path
//! is a simple indexed lookup off the parent's reference.

use tracing::trace;
use weft_tree::NodeRef;

use crate::error::GenError;
use crate::string;

/// Receiver for "this node/attribute produced a compiled segment"
/// events, reported in emission order. The diagnoser uses this to
/// re-compile each segment in isolation.
pub trait SegmentSink {
    /// A leaf's textual payload produced code.
    fn data(&mut self, node: &NodeRef);
    /// A branch attribute's value produced code.
    fn attr(&mut self, node: &NodeRef, name: &str);
}

/// Sink that ignores every event; used by plain compilation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SegmentSink for NullSink {
    fn data(&mut self, _node: &NodeRef) {}
    fn attr(&mut self, _node: &NodeRef, _name: &str) {}
}

/// A piece of not-yet-rendered body text. `Reference` stands for the
/// enclosing node's reference expression, which is only decided once
/// the node's whole subtree has been visited (the alias decision needs
/// the final use count).
#[derive(Clone, Debug)]
enum Chunk {
    Lit(String),
    Reference,
}

/// Generate the mutation body for a whole archetype tree.
///
/// `reference` names the instance root inside the generated code;
/// `namespace` prefixes every generated identifier; `may_alias` permits
/// binding `reference` to a local when it is compound. `Ok(None)` when
/// no leaf or attribute anywhere produced code.
pub fn generate(
    root: &NodeRef,
    reference: &str,
    namespace: &str,
    may_alias: bool,
    sink: &mut dyn SegmentSink,
) -> Result<Option<String>, GenError> {
    let root_reference = [Chunk::Lit(reference.to_string())];
    let body = visit(root, &root_reference, may_alias, namespace, namespace, 0, sink)?;
    let rendered = body.map(|chunks| render(&chunks));
    trace!(
        reference,
        namespace,
        compiled = rendered.is_some(),
        "tree codegen finished"
    );
    Ok(rendered)
}

/// Visit one node. Returned chunks may still contain
/// [`Chunk::Reference`] markers pointing at the *caller's* reference
/// placeholder; the caller splices them during its own resolution.
fn visit(
    node: &NodeRef,
    reference: &[Chunk],
    may_alias: bool,
    namespace: &str,
    prefix: &str,
    depth: usize,
    sink: &mut dyn SegmentSink,
) -> Result<Option<Vec<Chunk>>, GenError> {
    let mut body: Vec<Chunk> = Vec::new();
    let mut used = 0usize;

    if node.is_leaf() {
        let data = node.data().unwrap_or_default();
        let text_fn = format!("{prefix}text");
        if let Some(fragment) = string::generate(&data, &format!("{text_fn}_"))? {
            sink.data(node);
            body.push(Chunk::Lit(fragment.decl));
            body.push(Chunk::Lit(format!(
                "let {text_fn} = (target) => {};\n",
                fragment.expr
            )));
            body.push(Chunk::Reference);
            body.push(Chunk::Lit(format!(".data = {text_fn}(")));
            body.push(Chunk::Reference);
            body.push(Chunk::Lit(");\n".to_string()));
            used += 1;
        }
    } else {
        for (i, name) in node.attr_names().iter().enumerate() {
            let value = node.attr(name).unwrap_or_default();
            let attr_fn = format!("{prefix}attr{i}");
            if let Some(fragment) = string::generate(&value, &format!("{attr_fn}_"))? {
                sink.attr(node, name);
                body.push(Chunk::Lit(fragment.decl));
                body.push(Chunk::Lit(format!(
                    "let {attr_fn} = (target) => {};\n",
                    fragment.expr
                )));
                body.push(Chunk::Reference);
                body.push(Chunk::Lit(format!(
                    ".set_attr({}, {attr_fn}(",
                    string::quote(name)
                )));
                body.push(Chunk::Reference);
                body.push(Chunk::Lit("));\n".to_string()));
                used += 1;
            }
        }
    }

    // Descend unless the branch is opaque (raw-code containers are not
    // templated inside).
    if !node.is_opaque() {
        for (i, child) in node.children().iter().enumerate() {
            let child_reference = [
                Chunk::Reference,
                Chunk::Lit(format!(".children[{i}]")),
            ];
            let child_prefix = format!("{namespace}child{i}of{depth}");
            if let Some(child_body) = visit(
                child,
                &child_reference,
                true,
                namespace,
                &child_prefix,
                depth + 1,
                sink,
            )? {
                body.extend(child_body);
                used += 1;
            }
        }
    }

    match used {
        0 => Ok(None),
        more if more > 1 && may_alias => {
            // Bind the compound reference once; every internal use
            // becomes the alias name.
            let mut wrapped = vec![Chunk::Lit(format!("{{\nlet {prefix} = "))];
            wrapped.extend_from_slice(reference);
            wrapped.push(Chunk::Lit(";\n".to_string()));
            wrapped.extend(body.into_iter().map(|chunk| match chunk {
                Chunk::Reference => Chunk::Lit(prefix.to_string()),
                lit => lit,
            }));
            wrapped.push(Chunk::Lit("}\n".to_string()));
            Ok(Some(wrapped))
        }
        _ => Ok(Some(splice(body, reference))),
    }
}

/// Replace every [`Chunk::Reference`] with the given reference chunks.
fn splice(body: Vec<Chunk>, reference: &[Chunk]) -> Vec<Chunk> {
    let mut spliced = Vec::with_capacity(body.len());
    for chunk in body {
        match chunk {
            Chunk::Reference => spliced.extend_from_slice(reference),
            lit => spliced.push(lit),
        }
    }
    spliced
}

fn render(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        match chunk {
            Chunk::Lit(text) => out.push_str(text),
            // The root reference is a literal, so no marker survives
            // resolution at the top.
            Chunk::Reference => unreachable!("unresolved reference in rendered body"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn generate_quiet(root: &NodeRef) -> Result<Option<String>, GenError> {
        generate(root, "fragment", "_", false, &mut NullSink)
    }

    #[test]
    fn trees_without_expressions_generate_nothing() {
        assert_eq!(generate_quiet(&NodeRef::text("plain")), Ok(None));
        assert_eq!(
            generate_quiet(
                &NodeRef::branch("div")
                    .with_attr("class", "static")
                    .with_child(NodeRef::text("also static"))
            ),
            Ok(None)
        );
        // Unterminated delimiters are literal text everywhere.
        assert_eq!(
            generate_quiet(
                &NodeRef::branch("div")
                    .with_attr("class", "${{ bar }")
                    .with_child(NodeRef::text("${ foo"))
            ),
            Ok(None)
        );
    }

    #[test]
    fn leaf_data_emits_declaration_and_rewrite() {
        let body = generate_quiet(&NodeRef::text("a ${ x } b"))
            .unwrap()
            .unwrap();
        assert!(body.contains("let _text_2 = () => ( x );"));
        assert!(body.contains("let _text = (target) => \"a \" + _text_2() + \" b\";"));
        assert!(body.contains("fragment.data = _text(fragment);"));
    }

    #[test]
    fn attribute_emits_set_attr_with_quoted_name() {
        let body = generate_quiet(&NodeRef::branch("img").with_attr("src", "${ s }"))
            .unwrap()
            .unwrap();
        assert!(body.contains("let _attr0 = (target) =>"));
        assert!(body.contains("fragment.set_attr(\"src\", _attr0(fragment));"));
    }

    #[test]
    fn single_use_child_reference_is_inlined() {
        let root = NodeRef::branch("div").with_child(NodeRef::text("${ x }"));
        let body = generate_quiet(&root).unwrap().unwrap();
        assert!(body
            .contains("fragment.children[0].data = _child0of0text(fragment.children[0]);"));
        assert!(!body.contains("let _child0of0 ="));
    }

    #[test]
    fn multi_use_child_gets_an_alias_block() {
        let child = NodeRef::branch("a")
            .with_attr("href", "${ h }")
            .with_child(NodeRef::text("${ t }"));
        let root = NodeRef::branch("div").with_child(child);
        let body = generate_quiet(&root).unwrap().unwrap();
        assert!(body.contains("{\nlet _child0of0 = fragment.children[0];\n"));
        assert!(body.contains("_child0of0.set_attr(\"href\", _child0of0attr0(_child0of0));"));
        assert!(body
            .contains("_child0of0.children[0].data = _child0of1text(_child0of0.children[0]);"));
    }

    #[test]
    fn sibling_subtrees_may_repeat_declaration_names() {
        // Grandchildren at the same index and depth under different
        // parents share a prefix; each rewrite runs before the next
        // rebinding, so the collision is harmless.
        let root = NodeRef::branch("div")
            .with_child(NodeRef::branch("p").with_child(NodeRef::text("${ a }")))
            .with_child(NodeRef::branch("q").with_child(NodeRef::text("${ b }")));
        let body = generate_quiet(&root).unwrap().unwrap();
        assert_eq!(body.matches("let _child0of1text = ").count(), 2);
        assert!(body.contains(
            "fragment.children[0].children[0].data = _child0of1text(fragment.children[0].children[0]);"
        ));
        assert!(body.contains(
            "fragment.children[1].children[0].data = _child0of1text(fragment.children[1].children[0]);"
        ));
    }

    #[test]
    fn root_without_alias_permission_repeats_the_reference() {
        let root = NodeRef::branch("div")
            .with_attr("a", "${ x }")
            .with_attr("b", "${ y }");
        let body = generate_quiet(&root).unwrap().unwrap();
        // Two uses but may_alias is false at the top.
        assert!(!body.contains("let _ ="));
        assert_eq!(body.matches("fragment.set_attr(").count(), 2);
    }

    #[test]
    fn opaque_branch_children_are_skipped_attributes_are_not() {
        let script = NodeRef::opaque_branch("script")
            .with_child(NodeRef::text("alert(`is ${globalThis}`)"));
        assert_eq!(
            generate_quiet(&NodeRef::branch("div").with_child(script)),
            Ok(None)
        );

        let script = NodeRef::opaque_branch("script")
            .with_attr("src", "${ s }")
            .with_child(NodeRef::text("alert(`is ${globalThis}`)"));
        let body = generate_quiet(&NodeRef::branch("div").with_child(script))
            .unwrap()
            .unwrap();
        assert!(body.contains("set_attr(\"src\""));
        assert!(!body.contains("globalThis"));
    }

    #[test]
    fn comment_leaves_are_scanned() {
        let root = NodeRef::branch("div").with_child(NodeRef::comment("${ c }"));
        assert!(generate_quiet(&root).unwrap().is_some());
    }

    #[test]
    fn escape_collision_propagates_from_any_depth() {
        let root = NodeRef::branch("div")
            .with_child(NodeRef::branch("a").with_child(NodeRef::text("${ __weft_escape }")));
        assert!(matches!(
            generate_quiet(&root),
            Err(GenError::EscapeCollision { .. })
        ));
    }

    #[test]
    fn sink_sees_segments_in_emission_order() {
        #[derive(Default)]
        struct Recorder(Vec<String>);
        impl SegmentSink for Recorder {
            fn data(&mut self, node: &NodeRef) {
                self.0.push(format!("data:{}", node.data().unwrap()));
            }
            fn attr(&mut self, node: &NodeRef, name: &str) {
                self.0
                    .push(format!("attr:{}={}", name, node.attr(name).unwrap()));
            }
        }

        let root = NodeRef::branch("div")
            .with_attr("class", "${ a }")
            .with_child(NodeRef::branch("img").with_attr("src", "${ b }"))
            .with_child(NodeRef::text("${ c }"));
        let mut recorder = Recorder::default();
        generate(&root, "fragment", "_", false, &mut recorder)
            .unwrap()
            .unwrap();
        assert_eq!(
            recorder.0,
            vec![
                "attr:class=${ a }",
                "attr:src=${ b }",
                "data:${ c }",
            ]
        );
    }

    #[test]
    fn generated_bodies_parse_in_the_host_engine() {
        use weft_eval::{Closure, Engine, Host};

        let child = NodeRef::branch("a")
            .with_attr("href", "${ h }")
            .with_child(NodeRef::text("${ t }"));
        let root = NodeRef::branch("div")
            .with_attr("class", "${ c }")
            .with_child(child);
        let body = generate_quiet(&root).unwrap().unwrap();
        let closure = Closure::new();
        assert!(Engine
            .compile(&body, &["fragment".to_string()], &closure)
            .is_ok());
    }
}
