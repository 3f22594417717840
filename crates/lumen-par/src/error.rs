//! `SyntaxError`/`ScopeError`, the parser's slice of the error taxonomy
//! (`spec.md` §7). Fail-fast: the first one returned halts parsing.

use lumen_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("expected `;`")]
    MissingSemicolon { span: Span },

    #[error("unbalanced brackets")]
    UnbalancedBrackets { span: Span },

    #[error("unknown declaration form at top level")]
    UnknownDeclarationForm { span: Span },

    #[error("arity mismatch providing `{iface}` for `{target}`: expected {expected}, found {found}")]
    ImplArityMismatch {
        iface: String,
        target: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("impl member `{name}` out of order or missing")]
    ImplMemberMismatch { name: String, span: Span },

    #[error("`{keyword}` is not legal here")]
    ContextRestricted { keyword: &'static str, span: Span },

    #[error("redeclaration of `{name}` in the same scope")]
    Redeclaration { name: String, span: Span },

    #[error("invalid assignment target")]
    InvalidAssignmentTarget { span: Span },

    #[error("lexical error: {0}")]
    Lex(#[from] lumen_lex::LexError),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::MissingSemicolon { span }
            | ParseError::UnbalancedBrackets { span }
            | ParseError::UnknownDeclarationForm { span }
            | ParseError::ImplArityMismatch { span, .. }
            | ParseError::ImplMemberMismatch { span, .. }
            | ParseError::ContextRestricted { span, .. }
            | ParseError::Redeclaration { span, .. }
            | ParseError::InvalidAssignmentTarget { span } => *span,
            ParseError::Lex(e) => e.span(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
