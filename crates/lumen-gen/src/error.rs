//! `IRError`, codegen's slice of the error taxonomy (`spec.md` §7):
//! "codegen cannot lower a given construct."

use lumen_util::Span;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("codegen cannot lower this construct: {what}")]
    Unsupported { what: String, span: Span },

    #[error("no enclosing function to return from")]
    ReturnOutsideFunction { span: Span },

    #[error("block `{0}` not found")]
    BlockNotFound(String),

    #[error("internal codegen error: {0}")]
    Internal(String),
}

impl CodegenError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CodegenError::Unsupported { span, .. } => Some(*span),
            CodegenError::ReturnOutsideFunction { span } => Some(*span),
            CodegenError::BlockNotFound(_) | CodegenError::Internal(_) => None,
        }
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
