//! The elaborator: name resolution, type inference/checking, and explicit
//! `TypeConv` insertion (`spec.md` §4.2). Consumes the parser's tree and
//! hands back the same shape with every type slot filled and every
//! implicit conversion made a visible node — no separate HIR, per
//! `DESIGN.md`.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use lumen_ast::{
    BinOp, Case, CaseCond, Environment, Expr, ExprKind, FunctionLit, Param, PrefixOp, Program,
    Stmt, StmtKind,
};
use lumen_types::{Bottom, Convert, Type, TypeContext, TypeKind};
use lumen_util::{Handler, Span};

use crate::error::{SemError, SemResult};

/// Runs elaboration over a whole program in place, left to right over its
/// globals (`spec.md` §4.1: later globals may forward-reference earlier
/// ones and vice versa via `Alias`, but elaboration order is still the
/// declared order — only type *names*, not values, may be used before
/// their declaration). Returns the first error encountered; the caller
/// reports it through `handler`.
pub fn elaborate_program(types: &TypeContext, handler: &Handler, program: Program) -> SemResult<Program> {
    let elaborator = Elaborator::new(types);
    let root = Rc::clone(&program.root);
    let mut globals = Vec::with_capacity(program.globals.len());
    for stmt in program.globals {
        match elaborator.elaborate_stmt(stmt, &root) {
            Ok(s) => globals.push(s),
            Err(e) => {
                handler.error(e.to_string(), e.span());
                return Err(e);
            }
        }
    }
    Ok(Program { root, globals })
}

pub struct Elaborator<'a> {
    types: &'a TypeContext,
    /// The type `self` resolves members against while elaborating the
    /// body of an `impl ... for Target { ... }` member; `None` outside
    /// any impl block.
    self_ty: RefCell<Option<Rc<Type>>>,
}

impl<'a> Elaborator<'a> {
    pub fn new(types: &'a TypeContext) -> Self {
        Elaborator { types, self_ty: RefCell::new(None) }
    }

    pub fn elaborate_stmt(&self, stmt: Stmt, env: &Rc<Environment>) -> SemResult<Stmt> {
        let span = stmt.span;
        match stmt.kind {
            StmtKind::Declaration { is_const, name, def_id, declared_ty, value } => {
                let declared_ty = match declared_ty {
                    Some(t) => Some(self.resolve_ty(t, env, span)?),
                    None => None,
                };
                // A function literal bound with no declared type can still
                // call itself by name: its signature is registered on the
                // binding before the body is elaborated, so a lookup of
                // `name` from inside the body resolves instead of erroring.
                if declared_ty.is_none() {
                    if let Some(v) = &value {
                        if let ExprKind::Function(f) = &v.kind {
                            let sig = self.function_signature(f, span)?;
                            if let Some(binding) = env.get_member_local(name) {
                                *binding.ty.borrow_mut() = Some(sig);
                            }
                        }
                    }
                }
                let value = match value {
                    Some(v) => Some(self.elaborate_expr(*v, env)?),
                    None => None,
                };
                let final_ty = match (&declared_ty, &value) {
                    (Some(dt), _) => Rc::clone(dt),
                    (None, Some(v)) => v.ty().expect("value elaborated"),
                    (None, None) => return Err(SemError::DeclarationNeedsType { span }),
                };
                let value = match (declared_ty.as_ref(), value) {
                    (Some(dt), Some(v)) => {
                        let v_ty = v.ty().expect("value elaborated");
                        let c = widened_convertible_to(&v_ty, dt);
                        if !c.is_ok() {
                            return Err(SemError::InvalidAssignment { from: v_ty.to_string(), to: dt.to_string(), span });
                        }
                        Some(Box::new(wrap_if_implicit(v, dt, c)))
                    }
                    (_, v) => v.map(Box::new),
                };
                if declared_ty.is_none() {
                    if let Some(binding) = env.get_member_local(name) {
                        *binding.ty.borrow_mut() = Some(Rc::clone(&final_ty));
                    }
                }
                Ok(Stmt::new(span, StmtKind::Declaration {
                    is_const,
                    name,
                    def_id,
                    declared_ty: Some(final_ty),
                    value,
                }))
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(v) => Some(Box::new(self.elaborate_expr(*v, env)?)),
                    None => None,
                };
                Ok(Stmt::new(span, StmtKind::Return(value)))
            }
            StmtKind::Yield(value) => {
                let value = match value {
                    Some(v) => Some(Box::new(self.elaborate_expr(*v, env)?)),
                    None => None,
                };
                Ok(Stmt::new(span, StmtKind::Yield(value)))
            }
            StmtKind::ExprStmt(value) => {
                let value = self.elaborate_expr(*value, env)?;
                Ok(Stmt::new(span, StmtKind::ExprStmt(Box::new(value))))
            }
            StmtKind::Class { name, def_id, fields, struct_ty } => {
                let struct_ty = self.resolve_ty(struct_ty, env, span)?;
                let previous = self.self_ty.replace(Some(Rc::clone(&struct_ty)));
                let mut resolved_fields = Vec::with_capacity(fields.len());
                for f in fields {
                    resolved_fields.push(self.elaborate_member(f, env)?);
                }
                self.self_ty.replace(previous);
                Ok(Stmt::new(span, StmtKind::Class { name, def_id, fields: resolved_fields, struct_ty }))
            }
            StmtKind::Impl { name, def_id, decorating, members, impl_ty } => {
                let impl_ty = self.resolve_ty(impl_ty, env, span)?;
                // `impl Name for Target { ... }` elaborates its members with
                // `self` resolved against `Target`'s own type, not the
                // interface `Name` describes; `impl Name { ... }` (no
                // `for`) has no concrete target, so `self` stays `SelfRef`.
                let target_ty = match decorating {
                    Some(target_name) => {
                        let binding = env
                            .get_member(target_name)
                            .ok_or(SemError::UndeclaredType { name: target_name.to_string(), span })?;
                        Some(binding.ty.borrow().clone().ok_or(SemError::UndeclaredType { name: target_name.to_string(), span })?)
                    }
                    None => None,
                };
                let previous = self.self_ty.replace(target_ty);
                let mut resolved_members = Vec::with_capacity(members.len());
                for m in members {
                    resolved_members.push(self.elaborate_member(m, env)?);
                }
                self.self_ty.replace(previous);
                Ok(Stmt::new(span, StmtKind::Impl { name, def_id, decorating, members: resolved_members, impl_ty }))
            }
            StmtKind::TypeDef { name, def_id, alias_ty } => {
                let alias_ty = self.resolve_ty(alias_ty, env, span)?;
                Ok(Stmt::new(span, StmtKind::TypeDef { name, def_id, alias_ty }))
            }
            StmtKind::Continue => Ok(Stmt::new(span, StmtKind::Continue)),
        }
    }

    /// A class field or impl member: resolves its declared type and, if
    /// present, checks the default initializer against it.
    fn elaborate_member(&self, p: Param, env: &Rc<Environment>) -> SemResult<Param> {
        let declared_ty = match p.declared_ty {
            Some(t) => Some(self.resolve_ty(t, env, p.span)?),
            None => None,
        };
        let default = match p.default {
            Some(d) => {
                let d = self.elaborate_expr(*d, env)?;
                let d = match &declared_ty {
                    Some(dt) => {
                        let dty = d.ty().expect("value elaborated");
                        let c = dty.convertible_to(dt);
                        if !c.is_ok() {
                            return Err(SemError::InvalidAssignment { from: dty.to_string(), to: dt.to_string(), span: p.span });
                        }
                        wrap_if_implicit(d, dt, c)
                    }
                    None => d,
                };
                Some(Box::new(d))
            }
            None => None,
        };
        Ok(Param { span: p.span, name: p.name, def_id: p.def_id, declared_ty, default })
    }

    pub fn elaborate_expr(&self, expr: Expr, env: &Rc<Environment>) -> SemResult<Expr> {
        let span = expr.span;
        match expr.kind {
            ExprKind::Int(v) => Ok(Expr::with_ty(span, ExprKind::Int(v), env.bottom(Bottom::Int))),
            ExprKind::Float(v) => Ok(Expr::with_ty(span, ExprKind::Float(v), env.bottom(Bottom::Float))),
            ExprKind::Bool(v) => Ok(Expr::with_ty(span, ExprKind::Bool(v), env.bottom(Bottom::Bool))),
            ExprKind::Char(v) => Ok(Expr::with_ty(span, ExprKind::Char(v), env.bottom(Bottom::Char))),
            ExprKind::String(bytes) => {
                let len = bytes.len() as i64;
                let char_ty = env.bottom(Bottom::Char);
                let ty = Type::new(TypeKind::List(len, char_ty));
                Ok(Expr::with_ty(span, ExprKind::String(bytes), ty))
            }
            ExprKind::Void => Ok(Expr::with_ty(span, ExprKind::Void, env.bottom(Bottom::Void))),

            ExprKind::Literal(name) => {
                // `self` is never a declared binding — the parser gates its
                // legality by `ImplClassContext` alone (`spec.md` §4.1) and
                // hands it the `SelfRef` bottom type directly, the same way
                // `void` is a keyword rather than a lookup.
                if name.as_str() == "self" {
                    return Ok(Expr::with_ty(span, ExprKind::Literal(name), env.bottom(Bottom::SelfRef)));
                }
                let binding = env
                    .get_member(name)
                    .ok_or(SemError::Undeclared { name: name.to_string(), span })?;
                let ty = binding
                    .ty
                    .borrow()
                    .clone()
                    .ok_or(SemError::Undeclared { name: name.to_string(), span })?;
                Ok(Expr::with_ty(span, ExprKind::Literal(name), ty))
            }

            ExprKind::TypeConv { implicit, from, to, inner } => {
                let inner = self.elaborate_expr(*inner, env)?;
                Ok(Expr::with_ty(span, ExprKind::TypeConv { implicit, from, to: Rc::clone(&to), inner: Box::new(inner) }, to))
            }

            ExprKind::ConvertCall { to, inner } => {
                let to = self.resolve_ty(to, env, span)?;
                let inner = self.elaborate_expr(*inner, env)?;
                let from = inner.ty().expect("value elaborated");
                let conv = from.convertible_to(&to);
                if conv == Convert::False {
                    return Err(SemError::BadConversion { from: from.to_string(), to: to.to_string(), span });
                }
                Ok(Expr::with_ty(span, ExprKind::TypeConv { implicit: false, from, to: Rc::clone(&to), inner: Box::new(inner) }, to))
            }

            ExprKind::Prefix(op, inner) => {
                let inner = self.elaborate_expr(*inner, env)?;
                self.elaborate_prefix(op, inner, span, env)
            }

            ExprKind::Binary(op, left, right) => self.elaborate_binary(op, *left, *right, span, env),

            ExprKind::Get { expr: inner, name } => {
                let inner = self.elaborate_expr(*inner, env)?;
                let ty = inner.ty().expect("value elaborated");
                let base = unwrap_fully(&ty);
                let base = if matches!(base.kind, TypeKind::Bottom(Bottom::SelfRef)) {
                    self.self_ty.borrow().clone().unwrap_or(base)
                } else {
                    base
                };
                let member_ty = match &base.kind {
                    TypeKind::Struct(fields) => fields.iter().find(|f| f.name == name).map(|f| Rc::clone(&f.ty)),
                    TypeKind::Impl(members) => members.iter().find(|f| f.name == name).map(|f| Rc::clone(&f.ty)),
                    _ => None,
                };
                let member_ty = member_ty.ok_or(SemError::UnknownMember { name: name.to_string(), ty: ty.to_string(), span })?;
                Ok(Expr::with_ty(span, ExprKind::Get { expr: Box::new(inner), name }, member_ty))
            }

            ExprKind::Call { callee, params } => self.elaborate_call(*callee, params, span, env),

            ExprKind::If { cond, then_branch, else_branch } => {
                let cond = self.elaborate_expr(*cond, env)?;
                let cond = self.require_strict_bool(cond, env, span)?;
                let then_branch = self.elaborate_expr(*then_branch, env)?;
                match else_branch {
                    None => {
                        let ty = then_branch.ty().expect("value elaborated");
                        Ok(Expr::with_ty(span, ExprKind::If { cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch: None }, ty))
                    }
                    Some(else_branch) => {
                        let else_branch = self.elaborate_expr(*else_branch, env)?;
                        let (then_branch, else_branch, ty) = self.unify_branches(then_branch, else_branch, env);
                        Ok(Expr::with_ty(span, ExprKind::If { cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch: Some(Box::new(else_branch)) }, ty))
                    }
                }
            }

            ExprKind::While { cond, body } => {
                let cond = self.elaborate_expr(*cond, env)?;
                let cond = self.require_strict_bool(cond, env, span)?;
                let body = self.elaborate_expr(*body, env)?;
                let ty = body.ty().expect("value elaborated");
                Ok(Expr::with_ty(span, ExprKind::While { cond: Box::new(cond), body: Box::new(body) }, ty))
            }

            ExprKind::For { env: for_env, decl, body } => {
                let decl = self.elaborate_stmt(*decl, env)?;
                let body = self.elaborate_expr(*body, &for_env)?;
                let ty = body.ty().expect("value elaborated");
                Ok(Expr::with_ty(span, ExprKind::For { env: for_env, decl: Box::new(decl), body: Box::new(body) }, ty))
            }

            ExprKind::Block { stmts, env: block_env, returns, yields } => {
                let mut new_stmts = Vec::with_capacity(stmts.len());
                let mut yielded: Option<Rc<Type>> = None;
                let mut saw_return = false;
                let mut saw_yield = false;
                for s in stmts {
                    let is_return = matches!(s.kind, StmtKind::Return(_));
                    let is_yield = matches!(s.kind, StmtKind::Yield(_));
                    let s = self.elaborate_stmt(s, &block_env)?;
                    if is_return {
                        saw_return = true;
                    }
                    if is_yield {
                        saw_yield = true;
                        if let StmtKind::Yield(Some(v)) = &s.kind {
                            let vty = v.ty().expect("value elaborated");
                            yielded = Some(match yielded {
                                Some(acc) => self.types.merge(&acc, &vty),
                                None => vty,
                            });
                        }
                    }
                    new_stmts.push(s);
                }
                returns.set(saw_return);
                yields.set(saw_yield);
                let ty = if saw_yield {
                    yielded.unwrap_or_else(|| env.bottom(Bottom::Void))
                } else {
                    env.bottom(Bottom::Void)
                };
                Ok(Expr::with_ty(span, ExprKind::Block { stmts: new_stmts, env: block_env, returns, yields }, ty))
            }

            ExprKind::Match { cond, cases } => self.elaborate_match(*cond, cases, span, env),

            ExprKind::Function(f) => self.elaborate_function(f, span, env),
        }
    }

    /// The function's type as seen from outside, without touching its
    /// body — used both here and to pre-register a recursive binding's
    /// name before its body is elaborated.
    fn function_signature(&self, f: &FunctionLit, span: Span) -> SemResult<Rc<Type>> {
        let return_ty = self.resolve_ty(Rc::clone(&f.return_ty), &f.params, span)?;
        let param_tys = self.resolve_param_types(&f.params, span)?;
        Ok(Type::new(TypeKind::Function { params: param_tys, ret: return_ty }))
    }

    fn resolve_param_types(&self, params: &Rc<Environment>, span: Span) -> SemResult<Vec<Rc<Type>>> {
        let mut param_tys = Vec::with_capacity(params.member_count());
        for i in 0..params.member_count() {
            let binding = params.get_in_order(i).expect("index in range");
            let resolved = match binding.ty.borrow().clone() {
                Some(t) => self.resolve_ty(t, params, span)?,
                None => return Err(SemError::DeclarationNeedsType { span }),
            };
            *binding.ty.borrow_mut() = Some(Rc::clone(&resolved));
            param_tys.push(resolved);
        }
        Ok(param_tys)
    }

    fn elaborate_function(&self, f: FunctionLit, span: Span, _env: &Rc<Environment>) -> SemResult<Expr> {
        let FunctionLit { arity, name, params, return_ty, body } = f;
        let return_ty = self.resolve_ty(return_ty, &params, span)?;
        let param_tys = self.resolve_param_types(&params, span)?;
        let body = self.elaborate_expr(*body, &params)?;
        let body_ty = body.ty().expect("value elaborated");
        let c = body_ty.convertible_to(&return_ty);
        if !c.is_ok() {
            return Err(SemError::InvalidAssignment { from: body_ty.to_string(), to: return_ty.to_string(), span });
        }
        let body = wrap_if_implicit(body, &return_ty, c);
        let fn_ty = Type::new(TypeKind::Function { params: param_tys, ret: Rc::clone(&return_ty) });
        Ok(Expr::with_ty(
            span,
            ExprKind::Function(FunctionLit { arity, name, params, return_ty, body: Box::new(body) }),
            fn_ty,
        ))
    }

    fn elaborate_match(&self, cond: Expr, cases: Vec<Case>, span: Span, env: &Rc<Environment>) -> SemResult<Expr> {
        let cond = self.elaborate_expr(cond, env)?;
        let cond_ty = cond.ty().expect("value elaborated");
        let cond_base = unwrap_fully(&cond_ty);
        let branches = match &cond_base.kind {
            TypeKind::Sum(branches) => Some(branches.clone()),
            TypeKind::Bottom(Bottom::Int) | TypeKind::Struct(_) => None,
            _ => return Err(SemError::BadMatchCondition { found: cond_ty.to_string(), span }),
        };

        let mut new_cases = Vec::with_capacity(cases.len());
        let mut result_ty: Option<Rc<Type>> = None;
        for case in cases {
            let cond_kind = match case.cond {
                CaseCond::Expr(e) => CaseCond::Expr(Box::new(self.elaborate_expr(*e, env)?)),
                CaseCond::TypeSelector(ty) => {
                    let ty = self.resolve_ty(ty, env, case.span)?;
                    if let Some(branches) = &branches {
                        if !branches.iter().any(|b| b.convertible_to(&ty) == Convert::Same) {
                            return Err(SemError::UnknownSumBranch { name: ty.to_string(), ty: cond_ty.to_string(), span: case.span });
                        }
                    }
                    CaseCond::TypeSelector(ty)
                }
                CaseCond::Name(name) => CaseCond::Name(name),
            };
            let body = self.elaborate_expr(*case.body, env)?;
            let body_ty = body.ty().expect("value elaborated");
            result_ty = Some(match result_ty {
                Some(acc) => self.types.merge(&acc, &body_ty),
                None => body_ty,
            });
            new_cases.push(Case { span: case.span, cond: cond_kind, body: Box::new(body) });
        }

        let ty = result_ty.unwrap_or_else(|| env.bottom(Bottom::Void));
        Ok(Expr::with_ty(span, ExprKind::Match { cond: Box::new(cond), cases: new_cases }, ty))
    }

    fn elaborate_call(&self, callee: Expr, params: Vec<Expr>, span: Span, env: &Rc<Environment>) -> SemResult<Expr> {
        let callee = self.elaborate_expr(callee, env)?;
        let callee_ty = callee.ty().expect("value elaborated");
        let base = unwrap_fully(&callee_ty);
        match &base.kind {
            TypeKind::Function { params: param_tys, ret } => {
                if params.len() != param_tys.len() {
                    return Err(SemError::ArityMismatch { expected: param_tys.len(), found: params.len(), span });
                }
                let ret = Rc::clone(ret);
                let mut new_params = Vec::with_capacity(params.len());
                for (p, pt) in params.into_iter().zip(param_tys.iter()) {
                    let p = self.elaborate_expr(p, env)?;
                    new_params.push(self.check_arg(p, pt, span)?);
                }
                Ok(Expr::with_ty(span, ExprKind::Call { callee: Box::new(callee), params: new_params }, ret))
            }
            TypeKind::Struct(fields) => {
                if params.len() != fields.len() {
                    return Err(SemError::ArityMismatch { expected: fields.len(), found: params.len(), span });
                }
                let fields = fields.clone();
                let mut new_params = Vec::with_capacity(params.len());
                for (p, f) in params.into_iter().zip(fields.iter()) {
                    let p = self.elaborate_expr(p, env)?;
                    new_params.push(self.check_arg(p, &f.ty, span)?);
                }
                let result_ty = Rc::clone(&callee_ty);
                Ok(Expr::with_ty(span, ExprKind::Call { callee: Box::new(callee), params: new_params }, result_ty))
            }
            TypeKind::List(_, elem) => {
                if params.len() != 1 {
                    return Err(SemError::ArityMismatch { expected: 1, found: params.len(), span });
                }
                let elem = Rc::clone(elem);
                let mut iter = params.into_iter();
                let idx = self.elaborate_expr(iter.next().expect("len checked"), env)?;
                let int_ty = env.bottom(Bottom::Int);
                let idx = self.check_arg(idx, &int_ty, span)?;
                Ok(Expr::with_ty(span, ExprKind::Call { callee: Box::new(callee), params: vec![idx] }, elem))
            }
            _ => Err(SemError::NotCallable { ty: callee_ty.to_string(), span }),
        }
    }

    fn check_arg(&self, arg: Expr, expected: &Rc<Type>, span: Span) -> SemResult<Expr> {
        let arg_ty = arg.ty().expect("value elaborated");
        let c = arg_ty.convertible_to(expected);
        if !c.is_ok() {
            return Err(SemError::InvalidAssignment { from: arg_ty.to_string(), to: expected.to_string(), span });
        }
        Ok(wrap_if_implicit(arg, expected, c))
    }

    fn elaborate_prefix(&self, op: PrefixOp, inner: Expr, span: Span, env: &Rc<Environment>) -> SemResult<Expr> {
        match (op, &inner.kind) {
            (PrefixOp::Neg, ExprKind::Int(i)) => {
                Ok(Expr::with_ty(span, ExprKind::Int(i.wrapping_neg()), env.bottom(Bottom::Int)))
            }
            (PrefixOp::Neg, ExprKind::Float(f)) => {
                Ok(Expr::with_ty(span, ExprKind::Float(-f), env.bottom(Bottom::Float)))
            }
            (PrefixOp::Neg, _) => {
                let ty = inner.ty().expect("value elaborated");
                if !is_numeric(&unwrap_fully(&ty)) {
                    return Err(SemError::BadOperand { op: "-", requirement: "an Int or Float operand", found: ty.to_string(), span: inner.span });
                }
                Ok(Expr::with_ty(span, ExprKind::Prefix(op, Box::new(inner)), ty))
            }
            (PrefixOp::Not, ExprKind::Int(i)) => {
                Ok(Expr::with_ty(span, ExprKind::Int(!i), env.bottom(Bottom::Int)))
            }
            (PrefixOp::Not, ExprKind::Bool(b)) => {
                Ok(Expr::with_ty(span, ExprKind::Bool(!b), env.bottom(Bottom::Bool)))
            }
            (PrefixOp::Not, _) => {
                let ty = inner.ty().expect("value elaborated");
                let base = unwrap_fully(&ty);
                let ok = matches!(base.kind, TypeKind::Bottom(Bottom::Int) | TypeKind::Bottom(Bottom::Bool));
                if !ok {
                    return Err(SemError::BadOperand { op: "!", requirement: "an Int or Bool operand", found: ty.to_string(), span: inner.span });
                }
                Ok(Expr::with_ty(span, ExprKind::Prefix(op, Box::new(inner)), ty))
            }
        }
    }

    fn elaborate_binary(&self, op: BinOp, left: Expr, right: Expr, span: Span, env: &Rc<Environment>) -> SemResult<Expr> {
        let left = self.elaborate_expr(left, env)?;
        if op == BinOp::Assign {
            let right = self.elaborate_expr(right, env)?;
            return self.elaborate_assign(left, right, span);
        }
        let right = self.elaborate_expr(right, env)?;
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                let (l, r, ty) = self.unify_numeric(left, right, op_name(op), span, env)?;
                Ok(Expr::with_ty(span, ExprKind::Binary(op, Box::new(l), Box::new(r)), ty))
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                let (l, r, _) = self.unify_numeric(left, right, op_name(op), span, env)?;
                Ok(Expr::with_ty(span, ExprKind::Binary(op, Box::new(l), Box::new(r)), env.bottom(Bottom::Bool)))
            }
            BinOp::Rem | BinOp::Shl | BinOp::Shr | BinOp::BitAnd | BinOp::BitXor | BinOp::BitOr | BinOp::Range | BinOp::RangeInclusive => {
                let l = self.require_int(left, env, op_name(op))?;
                let r = self.require_int(right, env, op_name(op))?;
                Ok(Expr::with_ty(span, ExprKind::Binary(op, Box::new(l), Box::new(r)), env.bottom(Bottom::Int)))
            }
            BinOp::And | BinOp::Or => {
                let l = self.require_bool_operand(left, env, op_name(op))?;
                let r = self.require_bool_operand(right, env, op_name(op))?;
                Ok(Expr::with_ty(span, ExprKind::Binary(op, Box::new(l), Box::new(r)), env.bottom(Bottom::Bool)))
            }
            BinOp::Eq | BinOp::Ne => {
                let (l, r) = self.unify_equatable(left, right, op_name(op), span)?;
                Ok(Expr::with_ty(span, ExprKind::Binary(op, Box::new(l), Box::new(r)), env.bottom(Bottom::Bool)))
            }
            BinOp::Assign => unreachable!("handled above"),
        }
    }

    fn elaborate_assign(&self, left: Expr, right: Expr, span: Span) -> SemResult<Expr> {
        if !left.is_lvalue() {
            return Err(SemError::InvalidAssignment {
                from: right.ty().map(|t| t.to_string()).unwrap_or_default(),
                to: "an assignable location".into(),
                span,
            });
        }
        let left_ty = left.ty().expect("value elaborated");
        let right_ty = right.ty().expect("value elaborated");
        let c = right_ty.convertible_to(&left_ty);
        if !c.is_ok() {
            return Err(SemError::InvalidAssignment { from: right_ty.to_string(), to: left_ty.to_string(), span });
        }
        let right = wrap_if_implicit(right, &left_ty, c);
        Ok(Expr::with_ty(span, ExprKind::Binary(BinOp::Assign, Box::new(left), Box::new(right)), left_ty))
    }

    /// Mixed `Int`/`Float` operands always settle on `Float` (`spec.md`
    /// §4.2, §8 scenario 2; ground-truthed against
    /// `examples/original_source/src/type_checker.h`'s `visitBinaryExpr`).
    /// This does *not* go through [`TypeContext::merge`]/`convertible_to`
    /// — the numeric ladder there runs the other way on purpose
    /// (`Float→Int` is `IMPLICIT`, `Int→Float` is `FALSE`; see §3.1's
    /// note that widening at this stage happens elsewhere), so settling
    /// via merge would wrongly narrow `1 + 2.0` to `Int`. Shared by
    /// arithmetic and by If/Match branch unification when both branches
    /// are purely numeric.
    fn widen_numeric(&self, left: Expr, right: Expr, lt_base: &Rc<Type>, rt_base: &Rc<Type>, env: &Rc<Environment>) -> (Expr, Expr, Rc<Type>) {
        let lt_is_float = matches!(lt_base.as_bottom(), Some(Bottom::Float));
        let rt_is_float = matches!(rt_base.as_bottom(), Some(Bottom::Float));
        let target_is_float = lt_is_float || rt_is_float;
        let target = if target_is_float { env.bottom(Bottom::Float) } else { env.bottom(Bottom::Int) };
        let left = if target_is_float && !lt_is_float {
            wrap_if_implicit(left, &target, Convert::Implicit)
        } else {
            left
        };
        let right = if target_is_float && !rt_is_float {
            wrap_if_implicit(right, &target, Convert::Implicit)
        } else {
            right
        };
        (left, right, target)
    }

    /// Arithmetic/relational unification: both operands must already be
    /// `Int`/`Float`-rooted.
    fn unify_numeric(&self, left: Expr, right: Expr, op: &'static str, span: Span, env: &Rc<Environment>) -> SemResult<(Expr, Expr, Rc<Type>)> {
        let lt = left.ty().expect("value elaborated");
        let rt = right.ty().expect("value elaborated");
        let lt_base = unwrap_fully(&lt);
        let rt_base = unwrap_fully(&rt);
        if !is_numeric(&lt_base) {
            return Err(SemError::BadOperand { op, requirement: "an Int or Float operand", found: lt.to_string(), span: left.span });
        }
        if !is_numeric(&rt_base) {
            return Err(SemError::BadOperand { op, requirement: "an Int or Float operand", found: rt.to_string(), span: right.span });
        }
        Ok(self.widen_numeric(left, right, &lt_base, &rt_base, env))
    }

    /// `==`/`!=`: either side must be usable where the other is expected,
    /// same as a branch unification, but a `Sum` result means the two
    /// sides share no common type and the comparison is rejected outright
    /// rather than silently allowed (equality is not merge's problem).
    fn unify_equatable(&self, left: Expr, right: Expr, op: &'static str, span: Span) -> SemResult<(Expr, Expr)> {
        let lt = left.ty().expect("value elaborated");
        let rt = right.ty().expect("value elaborated");
        let merged = self.types.merge(&lt, &rt);
        if merged.is_sum() {
            return Err(SemError::BadOperand { op, requirement: "two comparable operands", found: format!("{lt} and {rt}"), span });
        }
        let lc = lt.convertible_to(&merged);
        let rc = rt.convertible_to(&merged);
        Ok((wrap_if_implicit(left, &merged, lc), wrap_if_implicit(right, &merged, rc)))
    }

    /// If/Match-branch unification: the generic least-upper-bound, except
    /// two purely numeric branches widen toward `Float` the same way
    /// arithmetic does (`if true 1 else 2.0` settles on `float`, not on
    /// `merge`'s `Float→Int`-implicit reading of the numeric ladder).
    fn unify_branches(&self, left: Expr, right: Expr, env: &Rc<Environment>) -> (Expr, Expr, Rc<Type>) {
        let lt = left.ty().expect("value elaborated");
        let rt = right.ty().expect("value elaborated");
        let lt_base = unwrap_fully(&lt);
        let rt_base = unwrap_fully(&rt);
        if is_numeric(&lt_base) && is_numeric(&rt_base) {
            return self.widen_numeric(left, right, &lt_base, &rt_base, env);
        }
        let merged = self.types.merge(&lt, &rt);
        let lc = lt.convertible_to(&merged);
        let rc = rt.convertible_to(&merged);
        let left = wrap_if_implicit(left, &merged, lc);
        let right = wrap_if_implicit(right, &merged, rc);
        (left, right, merged)
    }

    fn require_int(&self, e: Expr, env: &Rc<Environment>, op: &'static str) -> SemResult<Expr> {
        let ty = e.ty().expect("value elaborated");
        let int_ty = env.bottom(Bottom::Int);
        let c = ty.convertible_to(&int_ty);
        if !c.is_ok() {
            return Err(SemError::BadOperand { op, requirement: "an Int operand", found: ty.to_string(), span: e.span });
        }
        Ok(wrap_if_implicit(e, &int_ty, c))
    }

    fn require_strict_bool(&self, e: Expr, env: &Rc<Environment>, span: Span) -> SemResult<Expr> {
        let ty = e.ty().expect("value elaborated");
        if ty.convertible_to(&env.bottom(Bottom::Bool)) != Convert::Same {
            return Err(SemError::NonBoolCondition { found: ty.to_string(), span });
        }
        Ok(e)
    }

    /// `require_strict_bool` used as an operator-operand check (`&&`/`||`);
    /// shares the same strictness rule, different error shape.
    fn require_bool_operand(&self, e: Expr, env: &Rc<Environment>, op: &'static str) -> SemResult<Expr> {
        let ty = e.ty().expect("value elaborated");
        if ty.convertible_to(&env.bottom(Bottom::Bool)) != Convert::Same {
            return Err(SemError::BadOperand { op, requirement: "a Bool operand", found: ty.to_string(), span: e.span });
        }
        Ok(e)
    }

    /// Resolves every unresolved `Alias` reachable from `ty`, mutating
    /// their bodies in place via [`TypeContext::resolve_alias`] and
    /// returning the same `Rc` back. Guards against the recursive-type
    /// cycle a self-referential `class`/`type` produces (`SPEC_FULL.md`
    /// §9, "cyclic type graphs"): an alias is marked as "being resolved"
    /// before its body is walked, so a field that loops back to it is a
    /// no-op rather than infinite recursion.
    pub fn resolve_ty(&self, ty: Rc<Type>, env: &Environment, span: Span) -> SemResult<Rc<Type>> {
        let mut visiting = HashSet::new();
        self.resolve_ty_rec(&ty, env, span, &mut visiting)?;
        Ok(ty)
    }

    fn resolve_ty_rec(&self, ty: &Rc<Type>, env: &Environment, span: Span, visiting: &mut HashSet<usize>) -> SemResult<()> {
        match &ty.kind {
            TypeKind::Alias { name, body } => {
                let ptr = Rc::as_ptr(ty) as usize;
                if !visiting.insert(ptr) {
                    return Ok(());
                }
                let resolved = match body.borrow().clone() {
                    Some(r) => r,
                    None => {
                        let binding = env
                            .get_member(*name)
                            .ok_or(SemError::UndeclaredType { name: name.to_string(), span })?;
                        let r = binding
                            .ty
                            .borrow()
                            .clone()
                            .ok_or(SemError::UndeclaredType { name: name.to_string(), span })?;
                        self.types.resolve_alias(ty, Rc::clone(&r));
                        r
                    }
                };
                self.resolve_ty_rec(&resolved, env, span, visiting)?;
                visiting.remove(&ptr);
                Ok(())
            }
            TypeKind::Optional(inner) => self.resolve_ty_rec(inner, env, span, visiting),
            TypeKind::Tuple(parts) => {
                for p in parts {
                    self.resolve_ty_rec(p, env, span, visiting)?;
                }
                Ok(())
            }
            TypeKind::List(_, elem) => self.resolve_ty_rec(elem, env, span, visiting),
            TypeKind::Struct(fields) | TypeKind::Impl(fields) => {
                for f in fields {
                    self.resolve_ty_rec(&f.ty, env, span, visiting)?;
                }
                Ok(())
            }
            TypeKind::Sum(branches) => {
                for b in branches {
                    self.resolve_ty_rec(b, env, span, visiting)?;
                }
                Ok(())
            }
            TypeKind::Function { params, ret } => {
                for p in params {
                    self.resolve_ty_rec(p, env, span, visiting)?;
                }
                self.resolve_ty_rec(ret, env, span, visiting)
            }
            TypeKind::Bottom(_) => Ok(()),
        }
    }
}

/// Wraps `expr` in an implicit `TypeConv` to `to` unless `conv` is
/// already `Same`. Callers are responsible for having verified `conv`
/// isn't `False` (or `Explicit`, where that's disallowed) first.
fn wrap_if_implicit(expr: Expr, to: &Rc<Type>, conv: Convert) -> Expr {
    if conv.is_same() {
        return expr;
    }
    let span = expr.span;
    let from = expr.ty().expect("value elaborated");
    Expr::with_ty(span, ExprKind::TypeConv { implicit: true, from, to: Rc::clone(to), inner: Box::new(expr) }, Rc::clone(to))
}

/// Declaration-assignment convertibility: the general relation, plus the
/// one case the numeric ladder's intentional asymmetry doesn't cover on
/// its own (`spec.md` §3.1 notes widening happens elsewhere) — an `Int`
/// value always widens implicitly into a declared `Float`, e.g.
/// `let x: float = 3;` (§8 scenario 1).
fn widened_convertible_to(from: &Rc<Type>, to: &Rc<Type>) -> Convert {
    if matches!(from.as_bottom(), Some(Bottom::Int)) && matches!(to.as_bottom(), Some(Bottom::Float)) {
        return Convert::Implicit;
    }
    from.convertible_to(to)
}

fn unwrap_fully(ty: &Rc<Type>) -> Rc<Type> {
    if ty.is_alias() {
        unwrap_fully(&ty.unwrap_alias())
    } else {
        Rc::clone(ty)
    }
}

fn is_numeric(ty: &Rc<Type>) -> bool {
    matches!(ty.kind, TypeKind::Bottom(Bottom::Int) | TypeKind::Bottom(Bottom::Float))
}

fn op_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Rem => "%",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::Le => "<=",
        BinOp::Ge => ">=",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::BitAnd => "&",
        BinOp::BitXor => "^",
        BinOp::BitOr => "|",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::Range => "..",
        BinOp::RangeInclusive => "..=",
        BinOp::Assign => "=",
    }
}
