//! Code-generation faults.

use thiserror::Error;

/// A fault raised while generating source, before any host compilation
/// is attempted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenError {
    /// A user payload contains the reserved sentinel label used to
    /// neutralize unbalanced delimiters. Generated source could not be
    /// trusted, so generation stops immediately.
    #[error(
        "expression segment at offset {offset} contains the reserved token `__weft_escape`"
    )]
    EscapeCollision {
        /// Offset of the offending expression segment in its source
        /// string.
        offset: usize,
    },
}
