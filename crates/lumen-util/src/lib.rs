//! Core utilities shared by every phase of the compiler: source spans,
//! symbol interning, diagnostics, typed indices, and def ids.

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use index::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;
