//! Front door of the Weft template compiler.
//!
//! [`compile`] turns an archetype tree into a [`Callable`] that applies
//! every embedded template expression to an identically shaped instance
//! tree. [`diagnose`] walks the same generated code but compiles each
//! template segment in isolation, attributing every fault to the node
//! and attribute it came from. [`compile_str`] is the single-string
//! entry point underneath both.
//!
//! All three are host-agnostic: code execution goes through the
//! [`Host`] trait, with [`weft_eval::Engine`] as the built-in
//! implementation.

use thiserror::Error;
use tracing::debug;
use weft_codegen::{string, tree, GenError, NullSink, SegmentSink};
use weft_diagnostic::selector_of;
use weft_eval::{Callable, Closure, Host, SyntaxError, Value};
use weft_tree::NodeRef;

pub use weft_diagnostic::{Diagnostic, DiagnosticKind};

/// Compilation knobs shared by [`compile`] and [`diagnose`].
#[derive(Clone, Debug)]
pub struct Options {
    /// Name of the instance-tree parameter inside generated code.
    pub reference: String,
    /// Full parameter list of the produced callable; defaults to just
    /// the reference.
    pub signature: Option<Vec<String>>,
    /// Prefix for every generated identifier.
    pub namespace: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            reference: "fragment".to_string(),
            signature: None,
            namespace: "_".to_string(),
        }
    }
}

impl Options {
    fn signature(&self) -> Vec<String> {
        self.signature
            .clone()
            .unwrap_or_else(|| vec![self.reference.clone()])
    }
}

/// A fault raised by [`compile`] or [`compile_str`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CompileError {
    /// Code generation refused the input before any host involvement.
    #[error(transparent)]
    Gen(#[from] GenError),
    /// The host rejected the source of a single template string.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// The host rejected an aggregate tree body. Use [`diagnose`] to
    /// attribute the fault to a node.
    #[error("failed to compile")]
    Host {
        #[source]
        cause: SyntaxError,
    },
}

/// Compile one template string into a callable returning the rendered
/// string, or `Ok(None)` when it contains no expression segment.
pub fn compile_str(
    host: &dyn Host,
    text: &str,
    signature: &[String],
    closure: &Closure,
    namespace: &str,
) -> Result<Option<Callable>, CompileError> {
    let Some(fragment) = string::generate(text, namespace)? else {
        return Ok(None);
    };
    let body = format!("{}return ({});", fragment.decl, fragment.expr);
    let callable = host.compile(&body, signature, closure)?;
    Ok(Some(callable))
}

/// Compile an archetype tree into a callable that mutates an instance
/// tree in place, or `Ok(None)` when no leaf or attribute contains an
/// expression segment.
///
/// The callable's parameters are `options.signature`; by convention the
/// first one receives the instance tree.
pub fn compile(
    host: &dyn Host,
    archetype: &NodeRef,
    closure: &Closure,
    options: &Options,
) -> Result<Option<Callable>, CompileError> {
    let Some(body) = tree::generate(
        archetype,
        &options.reference,
        &options.namespace,
        false,
        &mut NullSink,
    )?
    else {
        return Ok(None);
    };
    debug!(body_len = body.len(), "compiling aggregate tree body");
    let callable = host
        .compile(&body, &options.signature(), closure)
        .map_err(|cause| CompileError::Host { cause })?;
    Ok(Some(callable))
}

/// Probe every template segment of an archetype tree individually.
///
/// `Ok(None)` when there is nothing to compile at all; otherwise
/// `Ok(Some(errors))`, empty when everything compiles. A non-empty
/// result lists one [`Diagnostic`] per failing segment; if every
/// segment passes but the assembled body still fails, a single
/// [`Diagnostic::Engine`] is reported instead.
pub fn diagnose(
    host: &dyn Host,
    archetype: &NodeRef,
    closure: &Closure,
    options: &Options,
) -> Result<Option<Vec<Diagnostic>>, CompileError> {
    let signature = options.signature();
    // Segments are probed with the reference bound as a plain value so
    // free-variable resolution matches the aggregate body.
    let mut probe_closure = Closure::new().with(options.reference.clone(), Value::Unit);
    for (name, value) in closure.bindings() {
        probe_closure.set(name, value.clone());
    }

    let mut probe = Probe {
        host,
        root: archetype,
        signature: &signature,
        closure: &probe_closure,
        namespace: &options.namespace,
        errors: Vec::new(),
    };
    let body = tree::generate(
        archetype,
        &options.reference,
        &options.namespace,
        false,
        &mut probe,
    )?;
    let mut errors = probe.errors;
    debug!(
        segments_failed = errors.len(),
        compiled = body.is_some(),
        "diagnosis walk finished"
    );

    if errors.is_empty() {
        let Some(body) = body else {
            return Ok(None);
        };
        if let Err(error) = host.compile(&body, &signature, closure) {
            errors.push(Diagnostic::Engine { error });
        }
    }
    Ok(Some(errors))
}

/// Sink that re-compiles each reported segment in isolation and records
/// a located diagnostic per failure.
struct Probe<'a> {
    host: &'a dyn Host,
    root: &'a NodeRef,
    signature: &'a [String],
    closure: &'a Closure,
    namespace: &'a str,
    errors: Vec<Diagnostic>,
}

impl Probe<'_> {
    fn probe(&self, text: &str) -> Result<(), SyntaxError> {
        // The tree walk only reports segments whose code generation
        // succeeded, so only the host can reject here.
        let Ok(Some(fragment)) = string::generate(text, self.namespace) else {
            return Ok(());
        };
        let body = format!("{}return ({});", fragment.decl, fragment.expr);
        self.host.compile(&body, self.signature, self.closure)?;
        Ok(())
    }
}

impl SegmentSink for Probe<'_> {
    fn data(&mut self, node: &NodeRef) {
        let text = node.data().unwrap_or_default();
        if let Err(error) = self.probe(&text) {
            self.errors.push(Diagnostic::Data {
                selector: selector_of(node, self.root),
                node: node.clone(),
                error,
            });
        }
    }

    fn attr(&mut self, node: &NodeRef, name: &str) {
        let value = node.attr(name).unwrap_or_default();
        if let Err(error) = self.probe(&value) {
            self.errors.push(Diagnostic::Attr {
                selector: selector_of(node, self.root),
                node: node.clone(),
                attr: name.to_string(),
                error,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_eval::Engine;

    #[test]
    fn string_without_expressions_compiles_to_nothing() {
        let result = compile_str(&Engine, "plain text", &[], &Closure::new(), "_");
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn string_compiles_to_a_renderer() {
        let closure = Closure::new().with("name", Value::string("weft"));
        let callable = compile_str(&Engine, "hi ${ name }!", &[], &closure, "_")
            .unwrap()
            .unwrap();
        assert_eq!(callable.call(&[]).unwrap(), Value::string("hi weft!"));
    }

    #[test]
    fn string_syntax_fault_propagates_unwrapped() {
        let err = compile_str(&Engine, "${ \\ }", &[], &Closure::new(), "_").unwrap_err();
        assert!(matches!(err, CompileError::Syntax(_)));
    }

    #[test]
    fn default_options() {
        let options = Options::default();
        assert_eq!(options.reference, "fragment");
        assert_eq!(options.namespace, "_");
        assert_eq!(options.signature(), vec!["fragment".to_string()]);
    }

    #[test]
    fn explicit_signature_wins_over_reference() {
        let options = Options {
            signature: Some(vec!["a".to_string(), "b".to_string()]),
            ..Options::default()
        };
        assert_eq!(
            options.signature(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn tree_host_rejection_is_wrapped() {
        let archetype = NodeRef::branch("div").with_attr("class", "${ \\ }");
        let err = compile(&Engine, &archetype, &Closure::new(), &Options::default())
            .unwrap_err();
        assert!(matches!(err, CompileError::Host { .. }));
        assert_eq!(err.to_string(), "failed to compile");
    }
}
