//! An AST-to-source printer, used to check the parse/print round-trip
//! property of `spec.md` §8: "for every expression without comments,
//! `parse` followed by an AST printer produces text that re-parses to a
//! structurally identical tree."
//!
//! Every composite node is printed fully parenthesized rather than
//! precedence-aware, so the printed text reparses to the same tree
//! regardless of the 16-level precedence chain it came from; this trades
//! a little readability for a printer that can never drop a paren the
//! parser would need. Char/string literals always print through `\xHH`
//! escapes for the same reason — no ambiguity with the active escape set.

use std::fmt::Write;

use crate::expr::{BinOp, CaseCond, Expr, ExprKind, PrefixOp};
use crate::stmt::{Stmt, StmtKind};
use crate::Program;

pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    for global in &program.globals {
        print_stmt_into(&mut out, global);
        out.push(' ');
    }
    out
}

pub fn print_stmt(stmt: &Stmt) -> String {
    let mut out = String::new();
    print_stmt_into(&mut out, stmt);
    out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    print_expr_into(&mut out, expr);
    out
}

fn print_stmt_into(out: &mut String, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Declaration { is_const, name, declared_ty, value, .. } => {
            out.push_str(if *is_const { "const " } else { "let " });
            out.push_str(name.as_str());
            if let Some(ty) = declared_ty {
                let _ = write!(out, ": {ty}");
            }
            if let Some(v) = value {
                out.push_str(" = ");
                print_expr_into(out, v);
            }
            out.push(';');
        }
        StmtKind::Return(value) => {
            out.push_str("return");
            if let Some(v) = value {
                out.push(' ');
                print_expr_into(out, v);
            }
            out.push(';');
        }
        StmtKind::Yield(value) => {
            out.push_str("yield");
            if let Some(v) = value {
                out.push(' ');
                print_expr_into(out, v);
            }
            out.push(';');
        }
        StmtKind::ExprStmt(value) => {
            print_expr_into(out, value);
            out.push(';');
        }
        StmtKind::Class { name, fields, .. } => {
            let _ = write!(out, "class {name} {{ ");
            for f in fields {
                print_member_into(out, f);
            }
            out.push_str("};");
        }
        StmtKind::Impl { name, decorating, members, .. } => {
            out.push_str("impl ");
            out.push_str(name.as_str());
            if let Some(target) = decorating {
                let _ = write!(out, " for {target}");
            }
            out.push_str(" { ");
            for m in members {
                print_member_into(out, m);
            }
            out.push_str("};");
        }
        StmtKind::TypeDef { name, alias_ty, .. } => {
            let _ = write!(out, "type {name} = {alias_ty};");
        }
        StmtKind::Continue => out.push_str("continue;"),
    }
}

fn print_member_into(out: &mut String, m: &crate::expr::Param) {
    let _ = write!(out, "{}: ", m.name);
    match &m.declared_ty {
        Some(ty) => {
            let _ = write!(out, "{ty}");
        }
        None => out.push_str("void"),
    }
    if let Some(d) = &m.default {
        out.push_str(" = ");
        print_expr_into(out, d);
    }
    out.push_str("; ");
}

fn print_expr_into(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Int(v) => {
            let _ = write!(out, "{v}");
        }
        ExprKind::Float(v) => {
            let _ = write!(out, "{v:?}");
        }
        ExprKind::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        ExprKind::Char(c) => {
            let _ = write!(out, "'\\x{c:02x}'");
        }
        ExprKind::String(bytes) => {
            out.push('"');
            for b in bytes {
                let _ = write!(out, "\\x{b:02x}");
            }
            out.push('"');
        }
        ExprKind::Void => out.push_str("void"),
        ExprKind::Literal(name) => out.push_str(name.as_str()),
        ExprKind::Binary(op, l, r) => {
            out.push('(');
            print_expr_into(out, l);
            let _ = write!(out, " {} ", bin_op_str(*op));
            print_expr_into(out, r);
            out.push(')');
        }
        ExprKind::Prefix(op, inner) => {
            out.push('(');
            out.push_str(match op {
                PrefixOp::Neg => "-",
                PrefixOp::Not => "!",
            });
            print_expr_into(out, inner);
            out.push(')');
        }
        ExprKind::Get { expr: inner, name } => {
            out.push('(');
            print_expr_into(out, inner);
            let _ = write!(out, ").{name}");
        }
        ExprKind::Call { callee, params } => {
            out.push('(');
            print_expr_into(out, callee);
            out.push_str(")(");
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                print_expr_into(out, p);
            }
            out.push(')');
        }
        ExprKind::ConvertCall { to, inner } => {
            let _ = write!(out, "convert({to}, ");
            print_expr_into(out, inner);
            out.push(')');
        }
        ExprKind::TypeConv { to, inner, .. } => {
            let _ = write!(out, "convert({to}, ");
            print_expr_into(out, inner);
            out.push(')');
        }
        ExprKind::If { cond, then_branch, else_branch } => {
            out.push_str("if ");
            print_expr_into(out, cond);
            out.push(' ');
            print_expr_into(out, then_branch);
            if let Some(e) = else_branch {
                out.push_str(" else ");
                print_expr_into(out, e);
            }
        }
        ExprKind::While { cond, body } => {
            out.push_str("while ");
            print_expr_into(out, cond);
            out.push(' ');
            print_expr_into(out, body);
        }
        ExprKind::For { decl, body, .. } => {
            let StmtKind::Declaration { name, value, .. } = &decl.kind else {
                unreachable!("for's desugared decl is always a Declaration");
            };
            let _ = write!(out, "for {name} in ");
            print_expr_into(out, value.as_ref().expect("for's iterator is always present"));
            out.push(' ');
            print_expr_into(out, body);
        }
        ExprKind::Block { stmts, .. } => {
            out.push_str("{ ");
            for s in stmts {
                print_stmt_into(out, s);
                out.push(' ');
            }
            out.push('}');
        }
        ExprKind::Match { cond, cases } => {
            out.push_str("match ");
            print_expr_into(out, cond);
            out.push_str(" { ");
            for case in cases {
                out.push_str("case ");
                match &case.cond {
                    CaseCond::Expr(e) => print_expr_into(out, e),
                    CaseCond::TypeSelector(ty) => {
                        let _ = write!(out, "{ty}");
                    }
                    CaseCond::Name(name) => out.push_str(name.as_str()),
                }
                out.push(' ');
                print_expr_into(out, &case.body);
                out.push(' ');
            }
            out.push('}');
        }
        ExprKind::Function(f) => {
            out.push_str("fn(");
            for i in 0..f.params.member_count() {
                let binding = f.params.get_in_order(i).expect("index in range");
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: ", binding.name);
                match binding.ty.borrow().as_ref() {
                    Some(ty) => {
                        let _ = write!(out, "{ty}");
                    }
                    None => out.push_str("void"),
                }
            }
            let _ = write!(out, ") -> {} ", f.return_ty);
            print_expr_into(out, &f.body);
        }
    }
}

fn bin_op_str(op: BinOp) -> &'static str {
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

/// Structural equality ignoring [`lumen_util::Span`]s and the type slot
/// (printed text always reparses pre-elaboration, so type slots are
/// `None` on both sides anyway); used by the round-trip property test
/// rather than deriving `PartialEq` on the whole AST, since `Expr`/`Stmt`
/// intentionally don't carry one (see their module docs on cloning).
pub fn expr_structurally_eq(a: &Expr, b: &Expr) -> bool {
    use ExprKind::*;
    match (&a.kind, &b.kind) {
        (Int(x), Int(y)) => x == y,
        (Float(x), Float(y)) => x.to_bits() == y.to_bits(),
        (Bool(x), Bool(y)) => x == y,
        (Char(x), Char(y)) => x == y,
        (String(x), String(y)) => x == y,
        (Void, Void) => true,
        (Literal(x), Literal(y)) => x == y,
        (Binary(op1, l1, r1), Binary(op2, l2, r2)) => {
            op1 == op2 && expr_structurally_eq(l1, l2) && expr_structurally_eq(r1, r2)
        }
        (Prefix(op1, i1), Prefix(op2, i2)) => op1 == op2 && expr_structurally_eq(i1, i2),
        (Get { expr: e1, name: n1 }, Get { expr: e2, name: n2 }) => {
            n1 == n2 && expr_structurally_eq(e1, e2)
        }
        (Call { callee: c1, params: p1 }, Call { callee: c2, params: p2 }) => {
            expr_structurally_eq(c1, c2)
                && p1.len() == p2.len()
                && p1.iter().zip(p2).all(|(x, y)| expr_structurally_eq(x, y))
        }
        (ConvertCall { to: t1, inner: i1 }, ConvertCall { to: t2, inner: i2 }) => {
            t1.to_string() == t2.to_string() && expr_structurally_eq(i1, i2)
        }
        (
            If { cond: c1, then_branch: t1, else_branch: e1 },
            If { cond: c2, then_branch: t2, else_branch: e2 },
        ) => {
            expr_structurally_eq(c1, c2)
                && expr_structurally_eq(t1, t2)
                && match (e1, e2) {
                    (Some(a), Some(b)) => expr_structurally_eq(a, b),
                    (None, None) => true,
                    _ => false,
                }
        }
        (While { cond: c1, body: b1 }, While { cond: c2, body: b2 }) => {
            expr_structurally_eq(c1, c2) && expr_structurally_eq(b1, b2)
        }
        (For { decl: d1, body: b1, .. }, For { decl: d2, body: b2, .. }) => {
            stmt_structurally_eq(d1, d2) && expr_structurally_eq(b1, b2)
        }
        (Block { stmts: s1, .. }, Block { stmts: s2, .. }) => {
            s1.len() == s2.len() && s1.iter().zip(s2).all(|(x, y)| stmt_structurally_eq(x, y))
        }
        (Match { cond: c1, cases: cs1 }, Match { cond: c2, cases: cs2 }) => {
            expr_structurally_eq(c1, c2)
                && cs1.len() == cs2.len()
                && cs1.iter().zip(cs2).all(|(x, y)| {
                    expr_structurally_eq(&x.body, &y.body)
                        && match (&x.cond, &y.cond) {
                            (CaseCond::Expr(a), CaseCond::Expr(b)) => expr_structurally_eq(a, b),
                            (CaseCond::TypeSelector(a), CaseCond::TypeSelector(b)) => {
                                a.to_string() == b.to_string()
                            }
                            (CaseCond::Name(a), CaseCond::Name(b)) => a == b,
                            _ => false,
                        }
                })
        }
        (Function(f1), Function(f2)) => {
            f1.arity == f2.arity
                && f1.return_ty.to_string() == f2.return_ty.to_string()
                && f1.params.member_count() == f2.params.member_count()
                && (0..f1.params.member_count()).all(|i| {
                    let b1 = f1.params.get_in_order(i).expect("index in range");
                    let b2 = f2.params.get_in_order(i).expect("index in range");
                    b1.name == b2.name
                })
                && expr_structurally_eq(&f1.body, &f2.body)
        }
        _ => false,
    }
}

pub fn stmt_structurally_eq(a: &Stmt, b: &Stmt) -> bool {
    match (&a.kind, &b.kind) {
        (
            StmtKind::Declaration { is_const: c1, name: n1, value: v1, .. },
            StmtKind::Declaration { is_const: c2, name: n2, value: v2, .. },
        ) => {
            c1 == c2
                && n1 == n2
                && match (v1, v2) {
                    (Some(a), Some(b)) => expr_structurally_eq(a, b),
                    (None, None) => true,
                    _ => false,
                }
        }
        (StmtKind::Return(v1), StmtKind::Return(v2)) | (StmtKind::Yield(v1), StmtKind::Yield(v2)) => {
            match (v1, v2) {
                (Some(a), Some(b)) => expr_structurally_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        (StmtKind::ExprStmt(a), StmtKind::ExprStmt(b)) => expr_structurally_eq(a, b),
        (StmtKind::Continue, StmtKind::Continue) => true,
        (StmtKind::TypeDef { name: n1, .. }, StmtKind::TypeDef { name: n2, .. }) => n1 == n2,
        (StmtKind::Class { name: n1, fields: f1, .. }, StmtKind::Class { name: n2, fields: f2, .. }) => {
            n1 == n2 && f1.len() == f2.len() && f1.iter().zip(f2).all(|(x, y)| x.name == y.name)
        }
        (
            StmtKind::Impl { name: n1, decorating: d1, members: m1, .. },
            StmtKind::Impl { name: n2, decorating: d2, members: m2, .. },
        ) => {
            n1 == n2
                && d1 == d2
                && m1.len() == m2.len()
                && m1.iter().zip(m2).all(|(x, y)| x.name == y.name)
        }
        _ => false,
    }
}
