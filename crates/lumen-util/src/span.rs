//! Source locations: a file handle plus a byte range with line/column.
//!
//! Every token, AST node, and diagnostic in the pipeline carries a [`Span`]
//! so that error messages can always print `[line:col]`.

use std::fmt;

/// Identifies one source file within a compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// The (only) file of a single-source compilation.
    pub const ROOT: FileId = FileId(0);
}

/// A byte range into one source file, with the 1-based line/column of its
/// start recorded alongside (columns are UTF-8 byte offsets within the line,
/// which is sufficient for this language's ASCII-biased lexical grammar).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: FileId,
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    /// A span with no real source backing, used for synthesized nodes
    /// (literal folding, inserted `TypeConv` wrappers with no better
    /// location than their operand).
    pub const DUMMY: Span = Span {
        file: FileId(u32::MAX),
        start: 0,
        end: 0,
        line: 0,
        column: 0,
    };

    pub const fn new(file: FileId, start: u32, end: u32, line: u32, column: u32) -> Self {
        Span {
            file,
            start,
            end,
            line,
            column,
        }
    }

    pub const fn is_dummy(&self) -> bool {
        self.file.0 == u32::MAX
    }

    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`. Assumes both spans
    /// belong to the same file; the earlier start's line/column wins.
    pub fn merge(&self, other: &Span) -> Span {
        if self.is_dummy() {
            return *other;
        }
        if other.is_dummy() {
            return *self;
        }
        let (start, line, column) = if self.start <= other.start {
            (self.start, self.line, self.column)
        } else {
            (other.start, other.line, other.column)
        };
        Span {
            file: self.file,
            start,
            end: self.end.max(other.end),
            line,
            column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_span_is_dummy() {
        assert!(Span::DUMMY.is_dummy());
        assert!(!Span::new(FileId::ROOT, 0, 1, 1, 1).is_dummy());
    }

    #[test]
    fn merge_picks_earlier_start() {
        let a = Span::new(FileId::ROOT, 10, 15, 2, 3);
        let b = Span::new(FileId::ROOT, 5, 8, 1, 1);
        let m = a.merge(&b);
        assert_eq!(m.start, 5);
        assert_eq!(m.end, 15);
        assert_eq!((m.line, m.column), (1, 1));
    }

    #[test]
    fn merge_with_dummy_returns_the_real_span() {
        let real = Span::new(FileId::ROOT, 0, 3, 1, 1);
        assert_eq!(real.merge(&Span::DUMMY), real);
        assert_eq!(Span::DUMMY.merge(&real), real);
    }

    #[test]
    fn display_is_line_colon_col() {
        let s = Span::new(FileId::ROOT, 0, 1, 4, 7);
        assert_eq!(format!("{s}"), "4:7");
    }
}
