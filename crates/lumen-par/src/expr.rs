//! Expression grammar: the 16-level precedence chain of `spec.md` §4.1,
//! from `parse_expr` (assign, loosest) down to `parse_primary` (tightest).
//! Block/if/while/for/match/function literals bypass this chain and are
//! parsed directly from `parse_primary`.

use std::rc::Rc;

use lumen_ast::{BinOp, Case, CaseCond, Expr, ExprKind, PrefixOp};
use lumen_lex::{Keyword, TokenKind};
use lumen_util::Symbol;

use crate::error::{ParseError, ParseResult};
use crate::parser::Parser;

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_assign()
    }

    // Level 16: assign, right-associative.
    fn parse_assign(&mut self) -> ParseResult<Expr> {
        let left = self.parse_range()?;
        if self.eat(TokenKind::Eq) {
            if !left.is_lvalue() {
                return Err(ParseError::InvalidAssignmentTarget { span: left.span });
            }
            let span = left.span;
            let right = self.parse_assign()?;
            return Ok(Expr::new(
                span.merge(&right.span),
                ExprKind::Binary(BinOp::Assign, Box::new(left), Box::new(right)),
            ));
        }
        Ok(left)
    }

    // Level 15: range, `..` / `..=`.
    fn parse_range(&mut self) -> ParseResult<Expr> {
        let left = self.parse_or()?;
        let op = if self.check(&TokenKind::DotDot) {
            Some(BinOp::Range)
        } else if self.check(&TokenKind::DotDotEq) {
            Some(BinOp::RangeInclusive)
        } else {
            None
        };
        let Some(op) = op else { return Ok(left) };
        self.bump();
        let right = self.parse_or()?;
        Ok(self.binary(op, left, right))
    }

    // Level 14: `||`.
    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = self.binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    // Level 13: `&&`.
    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bit_or()?;
        while self.eat(TokenKind::AmpAmp) {
            let right = self.parse_bit_or()?;
            left = self.binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    // Level 12: `|`.
    fn parse_bit_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_xor()?;
        while self.eat(TokenKind::Pipe) {
            let right = self.parse_xor()?;
            left = self.binary(BinOp::BitOr, left, right);
        }
        Ok(left)
    }

    // Level 11: `^`.
    fn parse_xor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bit_and()?;
        while self.eat(TokenKind::Caret) {
            let right = self.parse_bit_and()?;
            left = self.binary(BinOp::BitXor, left, right);
        }
        Ok(left)
    }

    // Level 10: `&`.
    fn parse_bit_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equate()?;
        while self.eat(TokenKind::Amp) {
            let right = self.parse_equate()?;
            left = self.binary(BinOp::BitAnd, left, right);
        }
        Ok(left)
    }

    // Level 9: `== !=`.
    fn parse_equate(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        loop {
            let op = if self.check(&TokenKind::EqEq) {
                BinOp::Eq
            } else if self.check(&TokenKind::Ne) {
                BinOp::Ne
            } else {
                break;
            };
            self.bump();
            let right = self.parse_not()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    // Level 8: prefix `!`.
    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Bang) {
            let span = self.current_span();
            self.bump();
            let inner = self.parse_not()?;
            let full = span.merge(&inner.span);
            return Ok(Expr::new(full, ExprKind::Prefix(PrefixOp::Not, Box::new(inner))));
        }
        self.parse_relation()
    }

    // Level 7: `< > <= >=`.
    fn parse_relation(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_shift()?;
        loop {
            let op = if self.check(&TokenKind::Lt) {
                BinOp::Lt
            } else if self.check(&TokenKind::Gt) {
                BinOp::Gt
            } else if self.check(&TokenKind::Le) {
                BinOp::Le
            } else if self.check(&TokenKind::Ge) {
                BinOp::Ge
            } else {
                break;
            };
            self.bump();
            let right = self.parse_shift()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    // Level 6: `<< >>`.
    fn parse_shift(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_add()?;
        loop {
            let op = if self.check(&TokenKind::Shl) {
                BinOp::Shl
            } else if self.check(&TokenKind::Shr) {
                BinOp::Shr
            } else {
                break;
            };
            self.bump();
            let right = self.parse_add()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    // Level 5: `+ -`.
    fn parse_add(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_mult()?;
        loop {
            let op = if self.check(&TokenKind::Plus) {
                BinOp::Add
            } else if self.check(&TokenKind::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            self.bump();
            let right = self.parse_mult()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    // Level 4: `* /` (and `%`, grouped here since it shares precedence
    // with multiplicative division in the original source).
    fn parse_mult(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_negate()?;
        loop {
            let op = if self.check(&TokenKind::Star) {
                BinOp::Mul
            } else if self.check(&TokenKind::Slash) {
                BinOp::Div
            } else if self.check(&TokenKind::Percent) {
                BinOp::Rem
            } else {
                break;
            };
            self.bump();
            let right = self.parse_negate()?;
            left = self.binary(op, left, right);
        }
        Ok(left)
    }

    // Level 3: prefix `-`.
    fn parse_negate(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Minus) {
            let span = self.current_span();
            self.bump();
            let inner = self.parse_negate()?;
            let full = span.merge(&inner.span);
            return Ok(Expr::new(full, ExprKind::Prefix(PrefixOp::Neg, Box::new(inner))));
        }
        self.parse_access()
    }

    // Level 2: postfix `.name` and `(args)`.
    fn parse_access(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(TokenKind::Dot) {
                let (name, name_span) = self.expect_ident()?;
                let full = expr.span.merge(&name_span);
                expr = Expr::new(full, ExprKind::Get { expr: Box::new(expr), name });
            } else if self.check(&TokenKind::LParen) {
                expr = self.parse_call(expr)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.parse_expr()?);
            while self.eat(TokenKind::Comma) {
                if self.check(&TokenKind::RParen) {
                    break;
                }
                params.push(self.parse_expr()?);
            }
        }
        let end = self.expect(TokenKind::RParen)?.span;
        let full = callee.span.merge(&start).merge(&end);
        Ok(Expr::new(
            full,
            ExprKind::Call {
                callee: Box::new(callee),
                params,
            },
        ))
    }

    // Level 1: primary expressions, plus the constructs that bypass the
    // precedence chain entirely (block/if/while/for/match/fn literal).
    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();
        match self.peek().kind.clone() {
            TokenKind::Int(v) => {
                self.bump();
                Ok(Expr::new(span, ExprKind::Int(v)))
            }
            TokenKind::Float(v) => {
                self.bump();
                Ok(Expr::new(span, ExprKind::Float(v)))
            }
            TokenKind::Char(c) => {
                self.bump();
                Ok(Expr::new(span, ExprKind::Char(c)))
            }
            TokenKind::Str(bytes) => {
                self.bump();
                Ok(Expr::new(span, ExprKind::String(bytes)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.bump();
                Ok(Expr::new(span, ExprKind::Bool(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.bump();
                Ok(Expr::new(span, ExprKind::Bool(false)))
            }
            TokenKind::Keyword(Keyword::Void) => {
                self.bump();
                Ok(Expr::new(span, ExprKind::Void))
            }
            TokenKind::Keyword(Keyword::SelfKw) => {
                if self.in_impl_class == crate::parser::ImplClassContext::Normal {
                    return Err(ParseError::ContextRestricted { keyword: "self", span });
                }
                self.bump();
                Ok(Expr::new(span, ExprKind::Literal(Symbol::intern("self"))))
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::Match) => self.parse_match(),
            TokenKind::Keyword(Keyword::Fn) => self.parse_function_literal(None),
            TokenKind::Keyword(Keyword::Return) => {
                unreachable!("return is a statement, parsed by parse_stmt")
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                let end = self.expect(TokenKind::RParen)?.span;
                Ok(Expr::new(span.merge(&end), inner.kind))
            }
            TokenKind::Ident(name) => {
                self.bump();
                if name.as_str() == "convert" && self.check(&TokenKind::LParen) {
                    return self.parse_convert_call(span);
                }
                Ok(Expr::new(span, ExprKind::Literal(name)))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "an expression".into(),
                found: other.describe(),
                span,
            }),
        }
    }

    /// `convert(TypeText, expr)`: the first argument is parsed as a type
    /// (`spec.md` §4.2, Call shape 1), producing a dedicated node the
    /// elaborator later turns into an explicit `TypeConv` once it knows
    /// the inner expression's type.
    fn parse_convert_call(&mut self, start: lumen_util::Span) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let to = self.parse_type()?;
        self.expect(TokenKind::Comma)?;
        let inner = self.parse_expr()?;
        let end = self.expect(TokenKind::RParen)?.span;
        Ok(Expr::new(
            start.merge(&end),
            ExprKind::ConvertCall {
                to,
                inner: Box::new(inner),
            },
        ))
    }

    fn binary(&self, op: BinOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(&right.span);
        Expr::new(span, ExprKind::Binary(op, Box::new(left), Box::new(right)))
    }

    fn parse_if(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect_kw(Keyword::If)?;
        let cond = self.parse_expr()?;
        let then_branch = self.parse_expr()?;
        let (else_branch, end) = if self.eat_kw(Keyword::Else) {
            let e = self.parse_expr()?;
            let sp = e.span;
            (Some(Box::new(e)), sp)
        } else {
            (None, then_branch.span)
        };
        Ok(Expr::new(
            start.merge(&end),
            ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch,
            },
        ))
    }

    fn parse_while(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect_kw(Keyword::While)?;
        let cond = self.parse_expr()?;
        let was_in_loop = self.in_loop;
        self.in_loop = true;
        let body = self.parse_expr();
        self.in_loop = was_in_loop;
        let body = body?;
        let full = start.merge(&body.span);
        Ok(Expr::new(
            full,
            ExprKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
        ))
    }

    /// `for IDEN in expr body`, desugared per `spec.md` §4.1 into a
    /// `Declaration(name, initializer=expr)` inside a fresh inner
    /// environment that becomes the loop's own scope.
    fn parse_for(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect_kw(Keyword::For)?;
        let (name, name_span) = self.expect_ident()?;
        self.expect_kw(Keyword::In)?;
        let iter = self.parse_expr()?;

        let was_in_loop = self.in_loop;
        self.in_loop = true;
        let (result, env) = self.with_inner_scope(|p| {
            let def_id = p.next_def_id();
            let decl_kind = lumen_ast::StmtKind::Declaration {
                is_const: false,
                name,
                def_id,
                declared_ty: None,
                value: Some(Box::new(iter)),
            };
            let binding = lumen_ast::Binding::new(name, def_id, false);
            p.scope.add_member(binding);
            let decl_stmt = Box::new(lumen_ast::Stmt::new(name_span, decl_kind));
            p.parse_expr().map(|body| (decl_stmt, body))
        });
        self.in_loop = was_in_loop;
        let (decl, body) = result?;

        let full = start.merge(&body.span);
        Ok(Expr::new(
            full,
            ExprKind::For {
                env,
                decl,
                body: Box::new(body),
            },
        ))
    }

    fn parse_match(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect_kw(Keyword::Match)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::LBrace)?;
        let mut cases = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            cases.push(self.parse_case()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Expr::new(
            start.merge(&end),
            ExprKind::Match {
                cond: Box::new(cond),
                cases,
            },
        ))
    }

    fn parse_case(&mut self) -> ParseResult<Case> {
        let start = self.current_span();
        self.expect_kw(Keyword::Case)?;
        let cond = if self.check(&TokenKind::LBrace) {
            // Bare-identifier / type-selector forms are only
            // distinguishable from an ordinary expression by trying the
            // type grammar first when the next token could start a type
            // and is *not* itself a full expression (e.g. a sole
            // identifier naming a sum branch).
            return Err(ParseError::UnexpectedToken {
                expected: "a case condition".into(),
                found: "`{`".into(),
                span: self.current_span(),
            });
        } else if let TokenKind::Ident(name) = self.peek().kind.clone() {
            // A bare identifier that does not resolve to a known
            // expression binding is read as the unit-variant sum-tag
            // form (`SPEC_FULL.md` §9, open question 2).
            if self.scope.get_member(name).is_none() {
                self.bump();
                CaseCond::Name(name)
            } else {
                CaseCond::Expr(Box::new(self.parse_expr()?))
            }
        } else if self.starts_type() {
            CaseCond::TypeSelector(self.parse_type()?)
        } else {
            CaseCond::Expr(Box::new(self.parse_expr()?))
        };
        let body = self.parse_expr()?;
        let full = start.merge(&body.span);
        Ok(Case {
            span: full,
            cond,
            body: Box::new(body),
        })
    }

    /// Heuristic used only to disambiguate a `case` condition: does the
    /// current token start the type grammar's keyword-led forms
    /// (`fn`/`list`/`optional`) that never start an ordinary expression.
    fn starts_type(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Keyword(Keyword::Fn)
                | TokenKind::Keyword(Keyword::List)
                | TokenKind::Keyword(Keyword::Optional)
        )
    }

    pub(crate) fn parse_function_literal(&mut self, name: Option<Symbol>) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect_kw(Keyword::Fn)?;
        self.expect(TokenKind::LParen)?;

        let (params_result, params_env) = self.with_inner_scope(|p| {
            let mut params = Vec::new();
            if !p.check(&TokenKind::RParen) {
                params.push(p.parse_param()?);
                while p.eat(TokenKind::Comma) {
                    if p.check(&TokenKind::RParen) {
                        break;
                    }
                    params.push(p.parse_param()?);
                }
            }
            ParseResult::Ok(params)
        });
        let params = params_result?;
        self.expect(TokenKind::RParen)?;

        let return_ty = if self.eat(TokenKind::Arrow) {
            self.parse_type()?
        } else {
            self.types.void()
        };

        // The body must see the parameters: re-enter `params_env` (rather
        // than the enclosing scope `with_inner_scope` already restored) for
        // the duration of parsing it.
        let outer = std::mem::replace(&mut self.scope, Rc::clone(&params_env));
        let body = self.parse_expr();
        self.scope = outer;
        let body = body?;
        let full = start.merge(&body.span);
        Ok(Expr::new(
            full,
            ExprKind::Function(lumen_ast::FunctionLit {
                arity: params.len(),
                name,
                params: params_env,
                return_ty,
                body: Box::new(body),
            }),
        ))
    }

    fn parse_param(&mut self) -> ParseResult<lumen_ast::Param> {
        let (name, span) = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let def_id = self.next_def_id();
        let binding = lumen_ast::Binding::new(name, def_id, false);
        binding.ty.replace(Some(Rc::clone(&ty)));
        self.scope.add_member(binding);
        Ok(lumen_ast::Param {
            span,
            name,
            def_id,
            declared_ty: Some(ty),
            default: None,
        })
    }

    pub(crate) fn parse_block(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect(TokenKind::LBrace)?;
        let was_in_block = self.in_block;
        self.in_block = true;
        let (stmts_result, env) = self.with_inner_scope(|p| {
            let mut stmts = Vec::new();
            while !p.check(&TokenKind::RBrace) && !p.at_eof() {
                stmts.push(p.parse_stmt()?);
            }
            ParseResult::Ok(stmts)
        });
        self.in_block = was_in_block;
        let stmts = stmts_result?;
        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Expr::new(
            start.merge(&end),
            ExprKind::Block {
                stmts,
                env,
                returns: std::cell::Cell::new(false),
                yields: std::cell::Cell::new(false),
            },
        ))
    }
}
