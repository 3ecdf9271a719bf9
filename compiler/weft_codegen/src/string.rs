//! String-level code generator.
//!
//! Consumes segments from `weft_segment` and produces a two-part source
//! fragment: declarations (one parameterless closure per expression
//! segment) and a single `+`-joined concatenation expression. Each
//! closure is named `prefix + offset`; offsets are strictly increasing
//! within one source string, so the names are unique per string.
//!
//! A payload classified as *statement-like* is wrapped in a labeled
//! `if (true)` that executes once and breaks the label, behind one
//! extra brace pair per `}` occurrence in the raw payload; expression
//! payloads get one extra paren pair per `)` occurrence. This keeps a
//! stray closing delimiter inside a payload from desynchronizing the
//! surrounding generated source. The label is built from a reserved
//! sentinel token; a payload containing that token fails generation
//! outright.

use weft_segment::{split, Segment};

use crate::error::GenError;

/// Reserved sentinel identifier prefixed to neutralization labels.
/// Must never appear in user payloads.
pub const ESCAPE_LABEL: &str = "__weft_escape";

/// Generated source for one template string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeFragment {
    /// A single `let` statement binding every segment closure, trailing
    /// newline included. Must be emitted before `expr` is evaluated.
    pub decl: String,
    /// The `+`-joined concatenation expression producing the final
    /// string.
    pub expr: String,
}

/// Generate code for one template string.
///
/// `Ok(None)` exactly when the segment parser finds no expression
/// segment — nothing to compile.
pub fn generate(text: &str, prefix: &str) -> Result<Option<CodeFragment>, GenError> {
    let Some(segments) = split(text) else {
        return Ok(None);
    };

    let mut bindings = Vec::new();
    let mut terms = Vec::new();
    for segment in segments {
        match segment {
            Segment::Constant { text, .. } => terms.push(quote(text)),
            Segment::Expression { text: body, offset } => {
                if body.contains(ESCAPE_LABEL) {
                    return Err(GenError::EscapeCollision { offset });
                }
                let name = format!("{prefix}{offset}");
                let value = if is_statement_like(body) {
                    statement_closure(body, offset)
                } else {
                    expression_closure(body)
                };
                bindings.push(format!("{name} = {value}"));
                terms.push(format!("{name}()"));
            }
        }
    }

    Ok(Some(CodeFragment {
        decl: format!("let {};\n", bindings.join(", ")),
        expr: terms.join(" + "),
    }))
}

/// A payload is statement-like when its trimmed body is empty, contains
/// the `return` keyword, or starts or ends with a statement separator.
fn is_statement_like(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.is_empty()
        || contains_return(trimmed)
        || trimmed.starts_with(';')
        || trimmed.ends_with(';')
}

/// Word-boundary search for the `return` keyword.
fn contains_return(body: &str) -> bool {
    body.match_indices("return").any(|(at, keyword)| {
        let before = body[..at].chars().next_back();
        let after = body[at + keyword.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parameterless closure running the payload as statements inside a
/// uniquely labeled `if (true)`, padded with one brace pair per `}` in
/// the raw payload plus one.
fn statement_closure(body: &str, offset: usize) -> String {
    let label = format!("{ESCAPE_LABEL}_{offset}");
    let pairs = body.matches('}').count() + 1;
    let open = "{".repeat(pairs);
    let close = "}".repeat(pairs);
    format!("() => {{ {label}: if (true) {open} {body} break {label}; {close} }}")
}

/// Parameterless closure returning the parenthesized payload, padded
/// with one paren pair per `)` in the raw payload plus one.
fn expression_closure(body: &str) -> String {
    let pairs = body.matches(')').count() + 1;
    let open = "(".repeat(pairs);
    let close = ")".repeat(pairs);
    format!("() => {open}{body}{close}")
}

/// Double-quoted literal for a constant segment.
pub(crate) fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nothing_to_compile() {
        assert_eq!(generate("plain", "_"), Ok(None));
        assert_eq!(generate("${ open", "_"), Ok(None));
        assert_eq!(generate("", "_"), Ok(None));
    }

    #[test]
    fn expression_segment_with_constants() {
        let fragment = generate("foo ${ bar } baz", "_t_").unwrap().unwrap();
        assert_eq!(fragment.decl, "let _t_4 = () => ( bar );\n");
        assert_eq!(fragment.expr, "\"foo \" + _t_4() + \" baz\"");
    }

    #[test]
    fn statement_segment_gets_labeled_wrapper() {
        let fragment = generate("${ return bar; }", "_t_").unwrap().unwrap();
        assert_eq!(
            fragment.decl,
            "let _t_0 = () => { __weft_escape_0: if (true) {  return bar;  break __weft_escape_0; } };\n"
        );
        assert_eq!(fragment.expr, "_t_0()");
    }

    #[test]
    fn empty_payload_is_statement_like() {
        let fragment = generate("${}", "_t_").unwrap().unwrap();
        assert!(fragment.decl.contains("if (true)"));
        assert!(fragment.decl.contains("break __weft_escape_0;"));
    }

    #[test]
    fn leading_or_trailing_separator_is_statement_like() {
        for text in ["${ ; x }", "${ x; }"] {
            let fragment = generate(text, "_t_").unwrap().unwrap();
            assert!(fragment.decl.contains("if (true)"), "{text}");
        }
    }

    #[test]
    fn return_requires_word_boundaries() {
        // `breturn` and `returns` are identifiers, not the keyword.
        let fragment = generate("${ breturns }", "_t_").unwrap().unwrap();
        assert_eq!(fragment.decl, "let _t_0 = () => ( breturns );\n");
    }

    #[test]
    fn close_paren_count_pads_expression_wrappers() {
        let fragment = generate("${ f(x) }", "_t_").unwrap().unwrap();
        assert_eq!(fragment.decl, "let _t_0 = () => (( f(x) ));\n");
    }

    #[test]
    fn close_brace_count_pads_statement_wrappers() {
        // The scanner is not quote-aware, so the payload needs widened
        // delimiters to keep its quoted `}` out of the close marker.
        let fragment = generate("${{ let s = '}'; }}", "_t_").unwrap().unwrap();
        assert_eq!(
            fragment.decl,
            "let _t_0 = () => { __weft_escape_0: if (true) {{  let s = '}';  break __weft_escape_0; }} };\n"
        );
        assert_eq!(fragment.expr, "_t_0()");
    }

    #[test]
    fn names_use_segment_offsets() {
        let fragment = generate("${a} and ${b}", "_t_").unwrap().unwrap();
        assert_eq!(
            fragment.decl,
            "let _t_0 = () => (a), _t_9 = () => (b);\n"
        );
        assert_eq!(fragment.expr, "_t_0() + \" and \" + _t_9()");
    }

    #[test]
    fn escape_token_collides_anywhere() {
        for text in [
            "${ __weft_escape }",
            "${ a + __weft_escape_0 }",
            "${ __weft_escapex }",
            "pre ${ ok } mid ${ __weft_escape } post",
        ] {
            let err = generate(text, "_t_").unwrap_err();
            assert!(matches!(err, GenError::EscapeCollision { .. }), "{text}");
        }
    }

    #[test]
    fn constants_are_quoted_and_escaped() {
        let fragment = generate("a\"b\\c\n${x}", "_t_").unwrap().unwrap();
        assert_eq!(
            fragment.expr,
            "\"a\\\"b\\\\c\\n\" + _t_6()"
        );
    }
}
