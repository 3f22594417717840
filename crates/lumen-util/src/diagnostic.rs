//! Diagnostics: fail-fast error reporting with source coordinates.
//!
//! Policy (per the error handling design): the first error halts the
//! pipeline. `Handler` never buffers more than `has_errors` needs to know;
//! callers check `has_errors()` after calling into a phase and return
//! early when it is true.

use std::cell::RefCell;
use std::fmt;

use crate::span::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Error,
    Warning,
    Note,
    Help,
}

impl Level {
    pub const fn is_error(&self) -> bool {
        matches!(self, Level::Error)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
            Level::Help => "help",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_dummy() {
            write!(f, "{}: {}", self.level, self.message)
        } else {
            write!(f, "[{}] {}", self.span, self.message)
        }?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

/// Fluent constructor for a [`Diagnostic`], mirroring the builder API
/// the rest of the pipeline is written against.
pub struct DiagnosticBuilder {
    diag: Diagnostic,
}

impl DiagnosticBuilder {
    pub fn error(message: impl Into<String>) -> Self {
        DiagnosticBuilder {
            diag: Diagnostic {
                level: Level::Error,
                message: message.into(),
                span: Span::DUMMY,
                notes: Vec::new(),
            },
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        DiagnosticBuilder {
            diag: Diagnostic {
                level: Level::Warning,
                message: message.into(),
                span: Span::DUMMY,
                notes: Vec::new(),
            },
        }
    }

    pub fn span(mut self, span: Span) -> Self {
        self.diag.span = span;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diag.notes.push(note.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        self.diag
    }
}

/// Collects diagnostics for one compilation and answers whether the
/// pipeline must stop.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
    error_count: RefCell<u32>,
}

impl Handler {
    pub fn new() -> Self {
        Handler::default()
    }

    pub fn emit(&self, diag: Diagnostic) {
        if diag.level.is_error() {
            *self.error_count.borrow_mut() += 1;
            eprintln!("{diag}");
        }
        self.diagnostics.borrow_mut().push(diag);
    }

    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.emit(DiagnosticBuilder::error(message).span(span).build());
    }

    pub fn has_errors(&self) -> bool {
        *self.error_count.borrow() > 0
    }

    pub fn error_count(&self) -> u32 {
        *self.error_count.borrow()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FileId;

    #[test]
    fn emitting_an_error_sets_has_errors() {
        let h = Handler::new();
        assert!(!h.has_errors());
        h.error("bad thing", Span::DUMMY);
        assert!(h.has_errors());
        assert_eq!(h.error_count(), 1);
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let h = Handler::new();
        h.emit(DiagnosticBuilder::warning("hm").build());
        assert!(!h.has_errors());
        assert_eq!(h.diagnostics().len(), 1);
    }

    #[test]
    fn display_includes_line_and_column() {
        let span = Span::new(FileId::ROOT, 0, 1, 3, 9);
        let diag = DiagnosticBuilder::error("oops").span(span).build();
        assert_eq!(format!("{diag}"), "[3:9] oops");
    }
}
