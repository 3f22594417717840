//! `ScopeError`/`TypeError`, the elaborator's slice of the error taxonomy
//! (`spec.md` §7). Fail-fast: elaboration returns on the first one.

use lumen_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SemError {
    #[error("use of undeclared name `{name}`")]
    Undeclared { name: String, span: Span },

    #[error("undeclared type `{name}`")]
    UndeclaredType { name: String, span: Span },

    #[error("a declaration needs a declared type or an initializer")]
    DeclarationNeedsType { span: Span },

    #[error("cannot convert `{from}` to `{to}`")]
    BadConversion { from: String, to: String, span: Span },

    #[error("expected a Bool condition, found `{found}`")]
    NonBoolCondition { found: String, span: Span },

    #[error("operator `{op}` requires {requirement}, found `{found}`")]
    BadOperand {
        op: &'static str,
        requirement: &'static str,
        found: String,
        span: Span,
    },

    #[error("expected {expected} arguments, found {found}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("`{ty}` has no member `{name}`")]
    UnknownMember { name: String, ty: String, span: Span },

    #[error("`{ty}` is not callable")]
    NotCallable { ty: String, span: Span },

    #[error("invalid assignment: cannot assign `{from}` to `{to}`")]
    InvalidAssignment { from: String, to: String, span: Span },

    #[error("match condition must be an Int, Sum, or Struct type, found `{found}`")]
    BadMatchCondition { found: String, span: Span },

    #[error("`{name}` does not name a branch of `{ty}`")]
    UnknownSumBranch { name: String, ty: String, span: Span },
}

impl SemError {
    pub fn span(&self) -> Span {
        match self {
            SemError::Undeclared { span, .. }
            | SemError::UndeclaredType { span, .. }
            | SemError::DeclarationNeedsType { span }
            | SemError::BadConversion { span, .. }
            | SemError::NonBoolCondition { span, .. }
            | SemError::BadOperand { span, .. }
            | SemError::ArityMismatch { span, .. }
            | SemError::UnknownMember { span, .. }
            | SemError::NotCallable { span, .. }
            | SemError::InvalidAssignment { span, .. }
            | SemError::BadMatchCondition { span, .. }
            | SemError::UnknownSumBranch { span, .. } => *span,
        }
    }
}

pub type SemResult<T> = Result<T, SemError>;
