//! `merge(A, B)`: least-upper-bound of two types, used to unify the
//! branches of a conditional or match expression.

use std::rc::Rc;

use crate::context::TypeContext;
use crate::convert::Convert;
use crate::{Type, TypeKind};

impl TypeContext {
    pub fn merge(&self, a: &Rc<Type>, b: &Rc<Type>) -> Rc<Type> {
        if a == b {
            return Rc::clone(a);
        }
        // Void is IMPLICIT to everything, so the generic convertibility
        // shortcut below would otherwise settle `merge(T, Void)` on the
        // bare `T` instead of `Optional(T)`. Check it first.
        if a.is_void() {
            return self.optional(Rc::clone(b));
        }
        if b.is_void() {
            return self.optional(Rc::clone(a));
        }
        let a_to_b = a.convertible_to(b);
        if a_to_b.is_ok() {
            return Rc::clone(b);
        }
        let b_to_a = b.convertible_to(a);
        if b_to_a.is_ok() {
            return Rc::clone(a);
        }

        match (&a.kind, &b.kind) {
            (TypeKind::Sum(a_branches), TypeKind::Sum(b_branches)) => {
                let mut merged: Vec<Rc<Type>> = a_branches.clone();
                for branch in b_branches {
                    if !merged.iter().any(|m| m.convertible_to(branch) == Convert::Same) {
                        merged.push(Rc::clone(branch));
                    }
                }
                Type::new(TypeKind::Sum(merged))
            }
            (TypeKind::Sum(a_branches), _) => extend_sum(a_branches, b),
            (_, TypeKind::Sum(b_branches)) => extend_sum(b_branches, a),
            _ => Type::new(TypeKind::Sum(vec![Rc::clone(a), Rc::clone(b)])),
        }
    }
}

fn extend_sum(branches: &[Rc<Type>], extra: &Rc<Type>) -> Rc<Type> {
    if branches.iter().any(|b| b.convertible_to(extra) == Convert::Same) {
        Type::new(TypeKind::Sum(branches.to_vec()))
    } else {
        let mut merged = branches.to_vec();
        merged.push(Rc::clone(extra));
        Type::new(TypeKind::Sum(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TypeContext;

    #[test]
    fn merge_same_type_is_identity() {
        let ctx = TypeContext::new();
        let m = ctx.merge(&ctx.int(), &ctx.int());
        assert!(m.convertible_to(&ctx.int()) == Convert::Same);
    }

    #[test]
    fn merge_with_void_gives_optional() {
        let ctx = TypeContext::new();
        let m = ctx.merge(&ctx.int(), &ctx.void());
        assert!(m.is_optional());
    }

    #[test]
    fn merge_void_with_void_stays_void() {
        let ctx = TypeContext::new();
        let m = ctx.merge(&ctx.void(), &ctx.void());
        assert!(m.is_void());
    }

    #[test]
    fn merge_implicitly_convertible_picks_destination() {
        let ctx = TypeContext::new();
        // float -> int is IMPLICIT, so merge(float, int) should settle on int
        let m = ctx.merge(&ctx.float(), &ctx.int());
        assert_eq!(m.convertible_to(&ctx.int()), Convert::Same);
    }

    #[test]
    fn merge_of_unrelated_bottoms_makes_a_sum() {
        let ctx = TypeContext::new();
        let m = ctx.merge(&ctx.bool_ty(), &ctx.char_ty());
        assert!(m.is_sum());
    }

    #[test]
    fn merge_is_commutative_up_to_branch_order() {
        let ctx = TypeContext::new();
        let a = ctx.merge(&ctx.bool_ty(), &ctx.char_ty());
        let b = ctx.merge(&ctx.char_ty(), &ctx.bool_ty());
        assert_eq!(a.convertible_to(&b), Convert::Same);
    }
}
