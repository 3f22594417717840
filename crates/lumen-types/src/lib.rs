//! The type lattice: the algebra of types, the convertibility relation,
//! and the merge (least-upper-bound) operation.
//!
//! This crate is deterministic and side-effect-free apart from the
//! shared-ownership reference counting of sub-types and the write-once
//! resolution of `Alias` bodies.

mod context;
mod convert;
mod merge;

pub use context::TypeContext;
pub use convert::Convert;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lumen_util::Symbol;

/// One of the six canonical scalar kinds. There is exactly one [`Type`]
/// instance per `Bottom` kind per compilation (seeded by [`TypeContext`]);
/// everything else compares structurally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bottom {
    Int,
    Char,
    Bool,
    Float,
    Void,
    SelfRef,
}

/// A named field or interface member: `(name, type)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: Symbol,
    pub ty: Rc<Type>,
}

#[derive(Debug)]
pub enum TypeKind {
    Bottom(Bottom),
    /// Holds a `T` or is absent. `Optional(Void)` must never be
    /// constructed — callers fold it to `Void` (see [`TypeContext::optional`]).
    Optional(Rc<Type>),
    Tuple(Vec<Rc<Type>>),
    /// `size >= 0` is a fixed length; `size == -1` denotes unbounded.
    List(i64, Rc<Type>),
    /// Ordered, named fields (a class body).
    Struct(Vec<Field>),
    /// Tagged union of product types.
    Sum(Vec<Rc<Type>>),
    Function {
        params: Vec<Rc<Type>>,
        ret: Rc<Type>,
    },
    /// A named reference to another type. The body is unresolved (`None`)
    /// until the elaborator binds it once through the environment; two
    /// aliases with the same name are equal regardless of body.
    Alias {
        name: Symbol,
        body: RefCell<Option<Rc<Type>>>,
    },
    /// An interface specification (trait-like): required members.
    Impl(Vec<Field>),
}

/// A type, optionally decorated with the set of interfaces it implements.
#[derive(Debug)]
pub struct Type {
    pub kind: TypeKind,
    pub interfaces: Vec<Rc<Type>>,
}

impl Type {
    pub fn new(kind: TypeKind) -> Rc<Type> {
        Rc::new(Type {
            kind,
            interfaces: Vec::new(),
        })
    }

    pub fn with_interfaces(kind: TypeKind, interfaces: Vec<Rc<Type>>) -> Rc<Type> {
        Rc::new(Type { kind, interfaces })
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self.kind, TypeKind::Bottom(_))
    }

    pub fn as_bottom(&self) -> Option<Bottom> {
        match self.kind {
            TypeKind::Bottom(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, TypeKind::Optional(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Bottom(Bottom::Void))
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.kind, TypeKind::Alias { .. })
    }

    pub fn is_sum(&self) -> bool {
        matches!(self.kind, TypeKind::Sum(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self.kind, TypeKind::Tuple(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, TypeKind::List(..))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeKind::Function { .. })
    }

    pub fn is_impl(&self) -> bool {
        matches!(self.kind, TypeKind::Impl(_))
    }

    /// Unwraps an alias to the type it names. Panics if called before
    /// elaboration has resolved the alias; every alias must be resolved
    /// by the time the elaborator finishes (see `SPEC_FULL.md` §8).
    pub fn unwrap_alias(self: &Rc<Self>) -> Rc<Type> {
        match &self.kind {
            TypeKind::Alias { body, .. } => body
                .borrow()
                .clone()
                .expect("alias body resolved before use"),
            _ => Rc::clone(self),
        }
    }
}

/// Structural equality. Two `Bottom`s of the same kind are equal because
/// `TypeContext` hands out one canonical `Rc` per kind and every other
/// comparison in the pipeline goes through `Rc::ptr_eq` first as a fast
/// path handled by callers; this impl covers the general structural case.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Bottom(a), TypeKind::Bottom(b)) => a == b,
            (TypeKind::Optional(a), TypeKind::Optional(b)) => a == b,
            (TypeKind::Tuple(a), TypeKind::Tuple(b)) => a == b,
            (TypeKind::List(sa, ta), TypeKind::List(sb, tb)) => sa == sb && ta == tb,
            (TypeKind::Struct(a), TypeKind::Struct(b)) => a == b,
            (TypeKind::Sum(a), TypeKind::Sum(b)) => a == b,
            (
                TypeKind::Function {
                    params: pa,
                    ret: ra,
                },
                TypeKind::Function {
                    params: pb,
                    ret: rb,
                },
            ) => pa == pb && ra == rb,
            (TypeKind::Alias { name: a, .. }, TypeKind::Alias { name: b, .. }) => a == b,
            (TypeKind::Impl(a), TypeKind::Impl(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Bottom(Bottom::Int) => write!(f, "int"),
            TypeKind::Bottom(Bottom::Char) => write!(f, "char"),
            TypeKind::Bottom(Bottom::Bool) => write!(f, "bool"),
            TypeKind::Bottom(Bottom::Float) => write!(f, "float"),
            TypeKind::Bottom(Bottom::Void) => write!(f, "void"),
            TypeKind::Bottom(Bottom::SelfRef) => write!(f, "self"),
            TypeKind::Optional(t) => write!(f, "optional[{t}]"),
            TypeKind::Tuple(ts) => {
                write!(f, "(")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
            TypeKind::List(size, t) => {
                if *size < 0 {
                    write!(f, "list[*, {t}]")
                } else {
                    write!(f, "list[{size}, {t}]")
                }
            }
            TypeKind::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, fld) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", fld.name, fld.ty)?;
                }
                write!(f, "}}")
            }
            TypeKind::Sum(ts) => {
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
            TypeKind::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            TypeKind::Alias { name, .. } => write!(f, "{name}"),
            TypeKind::Impl(members) => {
                write!(f, "impl{{")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", m.name, m.ty)?;
                }
                write!(f, "}}")
            }
        }
    }
}
