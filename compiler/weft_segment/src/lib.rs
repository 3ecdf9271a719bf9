//! Segment parser for Weft template strings.
//!
//! Splits one string into alternating constant and expression segments.
//! An expression segment is delimited by the two-character open marker
//! `${`, optionally *widened* by a run of extra `{`, and closed by the
//! first equally wide run of `}`:
//!
//! ```text
//! "a ${ x } b"      one expression, width 1
//! "a ${{ x }} b"    one expression, width 2; a single `}` inside the
//!                   payload is captured verbatim
//! ```
//!
//! An open marker with no matching close run is not an error: it stays
//! part of the surrounding constant text and scanning resumes just past
//! the opening run. The matcher is not brace-aware beyond width
//! counting; nested same-width delimiters are captured verbatim as part
//! of the expression body.

mod scan;

pub use scan::{split, Segment};
