//! The convertibility relation. Ground-truthed against the original
//! `Type::isConvertible` (a C++ switch ladder) and the prose of `spec.md`
//! §3.1, which is authoritative wherever it adds detail the original
//! snapshot doesn't (e.g. `List`'s exact size rule).

use std::rc::Rc;

use crate::{Bottom, Type, TypeKind};

/// Strength of rejection, weakest first: `SAME < IMPLICIT < EXPLICIT < FALSE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Convert {
    Same,
    Implicit,
    Explicit,
    False,
}

impl Convert {
    pub const fn is_same(self) -> bool {
        matches!(self, Convert::Same)
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Convert::Same | Convert::Implicit)
    }

    /// The worst (most-refusing) of two outcomes.
    pub fn worst(self, other: Convert) -> Convert {
        self.max(other)
    }
}

impl Type {
    /// `self.convertible_to(dest)`: can a value of type `self` be used
    /// where `dest` is expected, and how.
    pub fn convertible_to(self: &Rc<Self>, dest: &Rc<Type>) -> Convert {
        if self == dest {
            return Convert::Same;
        }

        // Void as destination.
        if dest.is_bottom() && dest.as_bottom() == Some(Bottom::Void) {
            if self.is_bottom() && self.as_bottom() == Some(Bottom::Void) {
                return Convert::Same;
            }
            if self.is_optional() {
                return Convert::Implicit;
            }
            return Convert::False;
        }

        // A bare `T` reaching an `Optional(U)` destination defers to
        // `T.convertibleTo(U)`, upgraded from SAME to IMPLICIT (wrapping a
        // plain value into the optional representation is never free).
        // Source `Optional(T)` is handled by its own arm below instead.
        if !self.is_optional() {
            if let TypeKind::Optional(dest_inner) = &dest.kind {
                let step = self.convertible_to(dest_inner);
                return if step.is_same() { Convert::Implicit } else { step };
            }
        }

        match &self.kind {
            TypeKind::Optional(inner) => {
                if let TypeKind::Optional(dest_inner) = &dest.kind {
                    inner.convertible_to(dest_inner)
                } else {
                    let ans = inner.convertible_to(dest);
                    if ans.is_same() {
                        Convert::Implicit
                    } else {
                        ans
                    }
                }
            }

            TypeKind::Bottom(b) => {
                if *b == Bottom::Void {
                    // The least element: implicitly convertible to anything.
                    return Convert::Implicit;
                }
                if let TypeKind::Alias { .. } = &dest.kind {
                    let ans = self.convertible_to(&dest.unwrap_alias());
                    return if ans.is_same() {
                        Convert::Implicit
                    } else {
                        ans
                    };
                }
                // `self` inside a member body is typed `SelfRef`; it must
                // reach the enclosing class's own `Struct` type to be
                // usable as an ordinary value there (e.g. returned, passed
                // to a function expecting the class type). `Impl` is an
                // interface description, not a value type, so it is not a
                // legal destination here.
                if *b == Bottom::SelfRef {
                    if matches!(dest.kind, TypeKind::Struct(_)) {
                        return Convert::Implicit;
                    }
                    return Convert::False;
                }
                let Some(db) = dest.as_bottom() else {
                    return Convert::False;
                };
                numeric_ladder(*b, db)
            }

            TypeKind::Tuple(parts) => {
                let TypeKind::Tuple(dest_parts) = &dest.kind else {
                    return Convert::False;
                };
                if parts.len() != dest_parts.len() {
                    return Convert::False;
                }
                let mut ans = Convert::Same;
                for (p, d) in parts.iter().zip(dest_parts.iter()) {
                    let step = p.convertible_to(d);
                    if step == Convert::False {
                        return Convert::False;
                    }
                    ans = ans.worst(step);
                }
                ans
            }

            TypeKind::List(size, elem) => {
                if let TypeKind::List(dest_size, dest_elem) = &dest.kind {
                    // Unbounded destination or source accepts any size;
                    // otherwise the destination must be no larger than
                    // the source (truncation, never padding).
                    if *size != -1 && *dest_size != -1 && *dest_size > *size {
                        return Convert::False;
                    }
                    let step = elem.convertible_to(dest_elem);
                    if step == Convert::False {
                        return Convert::False;
                    }
                    let sizes_differ = *size != -1 && *dest_size != -1 && *size != *dest_size;
                    if sizes_differ && step.is_same() {
                        Convert::Implicit
                    } else {
                        step
                    }
                } else {
                    let step = elem.convertible_to(dest);
                    if step == Convert::False {
                        Convert::False
                    } else {
                        Convert::Explicit
                    }
                }
            }

            TypeKind::Struct(fields) => {
                let TypeKind::Struct(dest_fields) = &dest.kind else {
                    return Convert::False;
                };
                if fields.len() != dest_fields.len() {
                    return Convert::False;
                }
                let mut renamed = false;
                for (f, d) in fields.iter().zip(dest_fields.iter()) {
                    if f.name != d.name {
                        let step = f.ty.convertible_to(&d.ty);
                        if step == Convert::False || step == Convert::Explicit {
                            return Convert::False;
                        }
                        renamed = true;
                    }
                }
                if renamed {
                    Convert::Explicit
                } else {
                    Convert::Same
                }
            }

            TypeKind::Alias { name, .. } => {
                if let TypeKind::Alias {
                    name: dest_name, ..
                } = &dest.kind
                {
                    if name == dest_name {
                        return Convert::Same;
                    }
                    let ans = self.unwrap_alias().convertible_to(&dest.unwrap_alias());
                    return if ans == Convert::False {
                        Convert::False
                    } else {
                        Convert::Explicit
                    };
                }
                let ans = self.unwrap_alias().convertible_to(dest);
                if ans.is_same() {
                    Convert::Implicit
                } else {
                    ans
                }
            }

            TypeKind::Impl(_) => Convert::False,

            TypeKind::Function {
                params,
                ret: source_ret,
            } => {
                let TypeKind::Function {
                    params: dest_params,
                    ret: dest_ret,
                } = &dest.kind
                else {
                    return Convert::False;
                };
                if params.len() != dest_params.len() {
                    return Convert::False;
                }
                let mut ans = dest_ret.convertible_to(source_ret);
                if ans == Convert::False {
                    return Convert::False;
                }
                for (p, d) in params.iter().zip(dest_params.iter()) {
                    let step = d.convertible_to(p);
                    if step == Convert::False || step == Convert::Explicit {
                        return Convert::False;
                    }
                    if step == Convert::Implicit {
                        ans = Convert::Implicit;
                    }
                }
                ans
            }

            TypeKind::Sum(branches) => {
                if let TypeKind::Sum(dest_branches) = &dest.kind {
                    // Every destination branch must be reachable from some
                    // source branch; the result is SAME only when the two
                    // branch sets match exactly (every pairing is SAME and
                    // the arities agree), IMPLICIT otherwise.
                    let mut all_same = branches.len() == dest_branches.len();
                    for d in dest_branches {
                        let mut reachable = Convert::False;
                        for s in branches {
                            let step = s.convertible_to(d);
                            if step.is_ok() {
                                reachable = step;
                                if step.is_same() {
                                    break;
                                }
                            }
                        }
                        if reachable == Convert::False {
                            return Convert::False;
                        }
                        if !reachable.is_same() {
                            all_same = false;
                        }
                    }
                    if all_same {
                        Convert::Same
                    } else {
                        Convert::Implicit
                    }
                } else {
                    let mut ans = Convert::False;
                    for branch in branches {
                        let step = branch.convertible_to(dest);
                        if step.is_ok() {
                            return Convert::Implicit;
                        }
                        if step == Convert::Explicit {
                            ans = Convert::Explicit;
                        }
                    }
                    ans
                }
            }
        }
    }
}

/// The per-`Bottom`-kind numeric ladder. Both sides are guaranteed
/// non-`Void` here (Void is handled by the caller before reaching this).
fn numeric_ladder(source: Bottom, dest: Bottom) -> Convert {
    use Bottom::*;
    match (source, dest) {
        (Int, Int) => Convert::Same,
        (Int, Char) => Convert::Implicit,
        (Int, Float) => Convert::False,

        (Char, Int) => Convert::Explicit,
        (Char, Char) => Convert::Same,
        (Char, Float) => Convert::False,

        (Float, Int) => Convert::Implicit,
        (Float, Char) => Convert::Explicit,
        (Float, Float) => Convert::Same,

        (Bool, Bool) => Convert::Same,

        (SelfRef, _) => Convert::False,
        _ => Convert::False,
    }
}

#[cfg(test)]
mod tests {
    use crate::context::TypeContext;
    use crate::convert::Convert;
    use crate::{Field, Type, TypeKind};
    use lumen_util::Symbol;

    #[test]
    fn identity_is_same() {
        let ctx = TypeContext::new();
        assert_eq!(ctx.int().convertible_to(&ctx.int()), Convert::Same);
    }

    #[test]
    fn int_to_char_is_implicit_char_to_int_is_explicit() {
        let ctx = TypeContext::new();
        assert_eq!(ctx.int().convertible_to(&ctx.char_ty()), Convert::Implicit);
        assert_eq!(ctx.char_ty().convertible_to(&ctx.int()), Convert::Explicit);
    }

    #[test]
    fn int_to_float_is_false_float_to_int_is_implicit() {
        let ctx = TypeContext::new();
        assert_eq!(ctx.int().convertible_to(&ctx.float()), Convert::False);
        assert_eq!(ctx.float().convertible_to(&ctx.int()), Convert::Implicit);
    }

    #[test]
    fn void_is_implicit_to_anything_and_anything_to_void_is_false_unless_optional() {
        let ctx = TypeContext::new();
        assert_eq!(ctx.void().convertible_to(&ctx.int()), Convert::Implicit);
        assert_eq!(ctx.int().convertible_to(&ctx.void()), Convert::False);
        let opt = ctx.optional(ctx.int());
        assert_eq!(opt.convertible_to(&ctx.void()), Convert::Implicit);
    }

    #[test]
    fn optional_source_defers_to_inner() {
        let ctx = TypeContext::new();
        let opt_int = ctx.optional(ctx.int());
        assert_eq!(opt_int.convertible_to(&ctx.int()), Convert::Implicit);
        let opt_char = ctx.optional(ctx.char_ty());
        assert_eq!(opt_int.convertible_to(&opt_char), Convert::Implicit);
    }

    #[test]
    fn bool_only_converts_to_bool() {
        let ctx = TypeContext::new();
        assert_eq!(ctx.bool_ty().convertible_to(&ctx.bool_ty()), Convert::Same);
        assert_eq!(ctx.bool_ty().convertible_to(&ctx.int()), Convert::False);
    }

    #[test]
    fn tuple_componentwise_worst_wins() {
        let ctx = TypeContext::new();
        let a = Type::new(TypeKind::Tuple(vec![ctx.int(), ctx.char_ty()]));
        let b = Type::new(TypeKind::Tuple(vec![ctx.char_ty(), ctx.char_ty()]));
        // int->char IMPLICIT, char->char SAME => worst == IMPLICIT
        assert_eq!(a.convertible_to(&b), Convert::Implicit);
    }

    #[test]
    fn tuple_arity_mismatch_is_false() {
        let ctx = TypeContext::new();
        let a = Type::new(TypeKind::Tuple(vec![ctx.int()]));
        let b = Type::new(TypeKind::Tuple(vec![ctx.int(), ctx.int()]));
        assert_eq!(a.convertible_to(&b), Convert::False);
    }

    #[test]
    fn struct_same_fields_is_same_renamed_compatible_is_explicit() {
        let ctx = TypeContext::new();
        let x = Symbol::intern("x");
        let y = Symbol::intern("y");
        let a = Type::new(TypeKind::Struct(vec![Field { name: x, ty: ctx.int() }]));
        let b = Type::new(TypeKind::Struct(vec![Field { name: x, ty: ctx.int() }]));
        assert_eq!(a.convertible_to(&b), Convert::Same);

        let c = Type::new(TypeKind::Struct(vec![Field { name: y, ty: ctx.int() }]));
        assert_eq!(a.convertible_to(&c), Convert::Explicit);
    }

    #[test]
    fn sum_source_to_non_sum_picks_best_branch() {
        let ctx = TypeContext::new();
        let sum = Type::new(TypeKind::Sum(vec![ctx.int(), ctx.bool_ty()]));
        // int -> float FALSE, bool -> float FALSE: overall FALSE
        assert_eq!(sum.convertible_to(&ctx.float()), Convert::False);
        // int -> int SAME present: overall IMPLICIT (best of any SAME/IMPLICIT)
        assert_eq!(sum.convertible_to(&ctx.int()), Convert::Implicit);
    }

    #[test]
    fn impl_as_source_is_always_false() {
        let ctx = TypeContext::new();
        let imp = Type::new(TypeKind::Impl(vec![]));
        assert_eq!(imp.convertible_to(&ctx.int()), Convert::False);
    }

    #[test]
    fn alias_same_name_is_same_regardless_of_body() {
        let ctx = TypeContext::new();
        let name = Symbol::intern("Id");
        let a = ctx.unresolved_alias(name);
        ctx.resolve_alias(&a, ctx.int());
        let b = ctx.unresolved_alias(name);
        ctx.resolve_alias(&b, ctx.float());
        assert_eq!(a.convertible_to(&b), Convert::Same);
    }
}
