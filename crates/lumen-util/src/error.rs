//! Shared low-level error types. Phase-specific error taxonomies
//! (lexical, syntax, scope, type, IR) live in their own crates; this is
//! only for the utility layer itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UtilError {
    #[error("symbol index {0} out of range")]
    SymbolOutOfRange(u32),
    #[error("index {index} out of range for a collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type UtilResult<T> = Result<T, UtilError>;
