//! Owns the canonical primitive singletons for one compilation.
//!
//! "Primitive identity: there is exactly one instance per Bottom kind per
//! compilation" — every `Bottom` variant handed out by the parser or
//! elaborator comes from here, so identity comparison (`Rc::ptr_eq`) is a
//! valid fast path anywhere a caller wants it, even though structural
//! `PartialEq` also agrees.

use std::rc::Rc;

use lumen_util::Symbol;

use crate::{Bottom, Type, TypeKind};

pub struct TypeContext {
    int: Rc<Type>,
    char_: Rc<Type>,
    bool_: Rc<Type>,
    float: Rc<Type>,
    void: Rc<Type>,
    self_ref: Rc<Type>,
}

impl TypeContext {
    pub fn new() -> Self {
        TypeContext {
            int: Type::new(TypeKind::Bottom(Bottom::Int)),
            char_: Type::new(TypeKind::Bottom(Bottom::Char)),
            bool_: Type::new(TypeKind::Bottom(Bottom::Bool)),
            float: Type::new(TypeKind::Bottom(Bottom::Float)),
            void: Type::new(TypeKind::Bottom(Bottom::Void)),
            self_ref: Type::new(TypeKind::Bottom(Bottom::SelfRef)),
        }
    }

    pub fn int(&self) -> Rc<Type> {
        Rc::clone(&self.int)
    }
    pub fn char_ty(&self) -> Rc<Type> {
        Rc::clone(&self.char_)
    }
    pub fn bool_ty(&self) -> Rc<Type> {
        Rc::clone(&self.bool_)
    }
    pub fn float(&self) -> Rc<Type> {
        Rc::clone(&self.float)
    }
    pub fn void(&self) -> Rc<Type> {
        Rc::clone(&self.void)
    }
    pub fn self_ref(&self) -> Rc<Type> {
        Rc::clone(&self.self_ref)
    }

    pub fn bottom(&self, kind: Bottom) -> Rc<Type> {
        match kind {
            Bottom::Int => self.int(),
            Bottom::Char => self.char_ty(),
            Bottom::Bool => self.bool_ty(),
            Bottom::Float => self.float(),
            Bottom::Void => self.void(),
            Bottom::SelfRef => self.self_ref(),
        }
    }

    /// `Optional(Void)` must never exist; this is the one constructor
    /// every caller goes through to enforce that invariant.
    pub fn optional(&self, inner: Rc<Type>) -> Rc<Type> {
        if inner.is_void() {
            self.void()
        } else {
            Type::new(TypeKind::Optional(inner))
        }
    }

    pub fn unresolved_alias(&self, name: Symbol) -> Rc<Type> {
        Type::new(TypeKind::Alias {
            name,
            body: std::cell::RefCell::new(None),
        })
    }

    /// Binds an alias's body. Write-once: calling this twice on an
    /// already-bound alias is a logic error in the elaborator.
    pub fn resolve_alias(&self, alias: &Rc<Type>, body: Rc<Type>) {
        match &alias.kind {
            TypeKind::Alias { body: cell, .. } => {
                let mut slot = cell.borrow_mut();
                assert!(slot.is_none(), "alias body resolved more than once");
                *slot = Some(body);
            }
            _ => panic!("resolve_alias called on a non-Alias type"),
        }
    }
}

impl Default for TypeContext {
    fn default() -> Self {
        TypeContext::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_kinds_are_canonical_per_context() {
        let ctx = TypeContext::new();
        assert!(Rc::ptr_eq(&ctx.int(), &ctx.int()));
        assert!(!Rc::ptr_eq(&ctx.int(), &ctx.float()));
    }

    #[test]
    fn optional_of_void_collapses_to_void() {
        let ctx = TypeContext::new();
        let collapsed = ctx.optional(ctx.void());
        assert!(collapsed.is_void());
    }

    #[test]
    fn optional_of_int_stays_optional() {
        let ctx = TypeContext::new();
        let opt = ctx.optional(ctx.int());
        assert!(opt.is_optional());
    }

    #[test]
    fn alias_resolves_once() {
        let ctx = TypeContext::new();
        let alias = ctx.unresolved_alias(Symbol::intern("Id"));
        ctx.resolve_alias(&alias, ctx.int());
        assert!(alias.unwrap_alias().is_bottom());
    }

    #[test]
    #[should_panic(expected = "resolved more than once")]
    fn resolving_twice_panics() {
        let ctx = TypeContext::new();
        let alias = ctx.unresolved_alias(Symbol::intern("Id"));
        ctx.resolve_alias(&alias, ctx.int());
        ctx.resolve_alias(&alias, ctx.float());
    }
}
