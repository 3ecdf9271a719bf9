//! Left-to-right scan for widened `${` … `}` delimiter pairs.
//!
//! The scan works on bytes; every delimiter character is ASCII, so byte
//! offsets are always char boundaries of the source string.

/// One slice of a scanned template string.
///
/// Segments are produced in document order. Adjacent expression segments
/// are never merged; the constant between two expressions is omitted only
/// when it is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, emitted verbatim.
    Constant {
        /// The literal slice of the source string.
        text: &'a str,
        /// Byte offset of the slice in the source string.
        offset: usize,
    },
    /// Raw text found between a matched delimiter pair.
    Expression {
        /// The inner text, delimiters excluded.
        text: &'a str,
        /// Byte offset of the open marker's `$`.
        offset: usize,
    },
}

impl<'a> Segment<'a> {
    /// The segment's text slice.
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Constant { text, .. } | Segment::Expression { text, .. } => text,
        }
    }

    /// Byte offset of the segment in the source string.
    ///
    /// Offsets are strictly increasing across one scan, which the code
    /// generator relies on for unique declaration names.
    pub fn offset(&self) -> usize {
        match self {
            Segment::Constant { offset, .. } | Segment::Expression { offset, .. } => *offset,
        }
    }

    /// `true` for [`Segment::Expression`].
    pub fn is_expression(&self) -> bool {
        matches!(self, Segment::Expression { .. })
    }
}

/// Split `text` into constant and expression segments.
///
/// Returns `None` when the text contains no expression segment at all —
/// "nothing to compile", distinct from an empty-but-valid result. Callers
/// must treat `None` as a no-op, not an error.
pub fn split(text: &str) -> Option<Vec<Segment<'_>>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    // Start of the pending constant. Spurious opens stay inside it.
    let mut const_start = 0;
    // Where the next open-marker search begins. Diverges from
    // `const_start` after a spurious open.
    let mut search_from = 0;
    let mut found = false;

    while let Some(open) = find_open(bytes, search_from) {
        // Count the widening run of extra `{` after the marker.
        let mut inner = open + 2;
        while inner < bytes.len() && bytes[inner] == b'{' {
            inner += 1;
        }
        let width = inner - open - 1;

        match find_close(bytes, inner, width) {
            Some(close) => {
                if open > const_start {
                    segments.push(Segment::Constant {
                        text: &text[const_start..open],
                        offset: const_start,
                    });
                }
                segments.push(Segment::Expression {
                    text: &text[inner..close],
                    offset: open,
                });
                found = true;
                const_start = close + width;
                search_from = const_start;
            }
            None => {
                // Unterminated open: treat it as literal text and resume
                // just past the opening run.
                search_from = inner;
            }
        }
    }

    if !found {
        return None;
    }
    if const_start < text.len() {
        segments.push(Segment::Constant {
            text: &text[const_start..],
            offset: const_start,
        });
    }
    Some(segments)
}

/// First `${` at or after `from`.
fn find_open(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'{' {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Start of the first run of `width` consecutive `}` at or after `from`.
fn find_close(bytes: &[u8], from: usize, width: usize) -> Option<usize> {
    let mut run = 0;
    for (i, byte) in bytes.iter().enumerate().skip(from) {
        if *byte == b'}' {
            run += 1;
            if run == width {
                return Some(i + 1 - width);
            }
        } else {
            run = 0;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_expressions() {
        assert_eq!(split(""), None);
        assert_eq!(split("plain text"), None);
        assert_eq!(split("${"), None);
        assert_eq!(split("}"), None);
        assert_eq!(split("${ foo"), None);
        assert_eq!(split("${{ bar }"), None);
        assert_eq!(split("${{{ baz }}"), None);
    }

    #[test]
    fn single_expression() {
        assert_eq!(
            split("${ foo }"),
            Some(vec![Segment::Expression {
                text: " foo ",
                offset: 0,
            }])
        );
    }

    #[test]
    fn surrounding_constants() {
        assert_eq!(
            split("a${ b }c"),
            Some(vec![
                Segment::Constant { text: "a", offset: 0 },
                Segment::Expression { text: " b ", offset: 1 },
                Segment::Constant { text: "c", offset: 7 },
            ])
        );
    }

    #[test]
    fn empty_expression_is_valid() {
        assert_eq!(
            split("${}"),
            Some(vec![Segment::Expression { text: "", offset: 0 }])
        );
    }

    #[test]
    fn widened_delimiters() {
        assert_eq!(
            split("${{ bar }}"),
            Some(vec![Segment::Expression {
                text: " bar ",
                offset: 0,
            }])
        );
        assert_eq!(
            split("${{{ bar }}}"),
            Some(vec![Segment::Expression {
                text: " bar ",
                offset: 0,
            }])
        );
    }

    #[test]
    fn narrow_close_runs_stay_inside_wider_expressions() {
        // A single `}` inside a width-2 expression is payload text.
        assert_eq!(
            split("${{ bar + '}' }}"),
            Some(vec![Segment::Expression {
                text: " bar + '}' ",
                offset: 0,
            }])
        );
    }

    #[test]
    fn spurious_open_is_literal_text() {
        // The unterminated `${{` stays part of the constant around the
        // later, valid pair.
        assert_eq!(
            split("x ${{ y ${ z }"),
            Some(vec![
                Segment::Constant {
                    text: "x ${{ y ",
                    offset: 0,
                },
                Segment::Expression {
                    text: " z ",
                    offset: 8,
                },
            ])
        );
    }

    #[test]
    fn nested_same_width_open_is_captured_verbatim() {
        assert_eq!(
            split("${ ${ x }"),
            Some(vec![Segment::Expression {
                text: " ${ x ",
                offset: 0,
            }])
        );
    }

    #[test]
    fn adjacent_expressions_have_no_constant_between() {
        assert_eq!(
            split("${a}${b}"),
            Some(vec![
                Segment::Expression { text: "a", offset: 0 },
                Segment::Expression { text: "b", offset: 4 },
            ])
        );
    }

    #[test]
    fn multibyte_constants_keep_byte_offsets() {
        let segments = split("é${x}è").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Constant { text: "é", offset: 0 },
                Segment::Expression { text: "x", offset: 2 },
                Segment::Constant { text: "è", offset: 6 },
            ]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_panics(input in ".*") {
                let _ = split(&input);
            }

            #[test]
            fn offsets_strictly_increase(input in ".*") {
                if let Some(segments) = split(&input) {
                    for pair in segments.windows(2) {
                        prop_assert!(pair[0].offset() < pair[1].offset());
                    }
                }
            }

            #[test]
            fn at_least_one_expression_when_some(input in ".*") {
                if let Some(segments) = split(&input) {
                    prop_assert!(segments.iter().any(Segment::is_expression));
                }
            }

            #[test]
            fn constants_are_verbatim_slices(input in ".*") {
                if let Some(segments) = split(&input) {
                    for segment in &segments {
                        if let Segment::Constant { text, offset } = segment {
                            prop_assert_eq!(
                                &input[*offset..offset + text.len()],
                                *text
                            );
                        }
                    }
                }
            }

            #[test]
            fn delimiter_free_input_is_no_op(input in "[a-z ]*") {
                prop_assert_eq!(split(&input), None);
            }

            // Worst-case recovery: many nested same-width opens must
            // still terminate, even if rescanning costs quadratic time.
            #[test]
            fn adversarial_opens_terminate(n in 0usize..64) {
                let input = "${".repeat(n);
                prop_assert_eq!(split(&input), None);
            }
        }
    }
}
