//! The typed AST: tagged-variant expression and statement nodes rooted
//! in a lexically scoped [`env::Environment`] tree.
//!
//! Per the redesign flag in `spec.md` §9, this is a plain tagged-variant
//! tree with exhaustive `match` dispatch, not a polymorphic visitor
//! hierarchy: every node already carries its own [`lumen_util::Span`]
//! and (once elaborated) its [`lumen_types::Type`], so matching on the
//! `Kind` enum is both simpler and exhaustiveness-checked by the
//! compiler, unlike a dynamic-dispatch `accept`/`visit` pair.

pub mod env;
pub mod expr;
pub mod printer;
pub mod stmt;

pub use env::{Binding, BottomTypes, Environment, Redeclaration};
pub use expr::{BinOp, Case, CaseCond, Expr, ExprKind, FunctionLit, Param, PrefixOp};
pub use printer::{expr_structurally_eq, print_expr, print_program, print_stmt, stmt_structurally_eq};
pub use stmt::{Stmt, StmtKind};

use std::rc::Rc;

/// The result of parsing in `PROGRAM` mode: the root environment plus its
/// ordered top-level declarations (`spec.md` §4.1's "zero or more
/// globals").
pub struct Program {
    pub root: Rc<Environment>,
    pub globals: Vec<Stmt>,
}
