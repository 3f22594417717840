//! Statement nodes.

use std::rc::Rc;

use lumen_types::Type;
use lumen_util::{DefId, Span, Symbol};

use crate::expr::{Expr, Param};

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `let`/`const name[: Type] [= value];`. `declared_ty` is the
    /// syntactic annotation (possibly an unresolved `Alias`); `def_id`
    /// names the binding this declaration installs into its enclosing
    /// [`crate::env::Environment`].
    Declaration {
        is_const: bool,
        name: Symbol,
        def_id: DefId,
        declared_ty: Option<Rc<Type>>,
        value: Option<Box<Expr>>,
    },
    Return(Option<Box<Expr>>),
    Yield(Option<Box<Expr>>),
    ExprStmt(Box<Expr>),
    /// `class Name { fields... }`. `struct_ty` is filled once the
    /// elaborator has walked the field declarations.
    Class {
        name: Symbol,
        def_id: DefId,
        fields: Vec<Param>,
        struct_ty: Rc<Type>,
    },
    /// `impl Name { members... }` (interface) or `impl Name for Target
    /// { members... }` (implementation). `decorating` is `Some(Target)`
    /// for the providing form.
    Impl {
        name: Symbol,
        def_id: DefId,
        decorating: Option<Symbol>,
        members: Vec<Param>,
        impl_ty: Rc<Type>,
    },
    TypeDef {
        name: Symbol,
        def_id: DefId,
        alias_ty: Rc<Type>,
    },
    /// Only legal where `inLoop` holds (`spec.md` §4.1); carries no value
    /// (`SPEC_FULL.md` §9 open-question resolution 3: `break` is not in
    /// the closed keyword set, so only `continue` is a keyword statement).
    Continue,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(span: Span, kind: StmtKind) -> Stmt {
        Stmt { span, kind }
    }
}
