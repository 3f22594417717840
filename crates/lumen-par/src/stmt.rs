//! Statement grammar, used both inside `{ }` blocks and (via the
//! `Declaration`/`TypeDef`/`Class`/`Impl` forms) at the top level.

use lumen_ast::{Stmt, StmtKind};
use lumen_lex::{Keyword, TokenKind};

use crate::error::{ParseError, ParseResult};
use crate::parser::Parser;

impl<'a> Parser<'a> {
    /// One statement inside a `{ }` block.
    pub(crate) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let span = self.current_span();
        match self.peek().kind.clone() {
            TokenKind::Keyword(Keyword::Let) | TokenKind::Keyword(Keyword::Const) => {
                self.parse_declaration_stmt()
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.bump();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                self.expect_semicolon()?;
                Ok(Stmt::new(span, StmtKind::Return(value)))
            }
            TokenKind::Keyword(Keyword::Yield) => {
                if !self.in_block {
                    return Err(ParseError::ContextRestricted { keyword: "yield", span });
                }
                self.bump();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                self.expect_semicolon()?;
                Ok(Stmt::new(span, StmtKind::Yield(value)))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                if !self.in_loop {
                    return Err(ParseError::ContextRestricted { keyword: "continue", span });
                }
                self.bump();
                self.expect_semicolon()?;
                Ok(Stmt::new(span, StmtKind::Continue))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect_semicolon()?;
                let full = span.merge(&expr.span);
                Ok(Stmt::new(full, StmtKind::ExprStmt(Box::new(expr))))
            }
        }
    }

    fn parse_declaration_stmt(&mut self) -> ParseResult<Stmt> {
        let span = self.current_span();
        let is_const = self.check_kw(Keyword::Const);
        self.bump(); // `let` or `const`
        let (name, _) = self.expect_ident()?;

        let declared_ty = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let value = if self.eat(TokenKind::Eq) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_semicolon()?;

        let def_id = self.next_def_id();
        let state = self.scope.redeclaration_state(name);
        if state == lumen_ast::Redeclaration::Redeclaration {
            return Err(ParseError::Redeclaration {
                name: name.to_string(),
                span,
            });
        }
        let binding = lumen_ast::Binding::new(name, def_id, is_const);
        if let Some(ty) = &declared_ty {
            binding.ty.replace(Some(std::rc::Rc::clone(ty)));
        }
        self.scope.add_member(binding);

        Ok(Stmt::new(
            span,
            StmtKind::Declaration {
                is_const,
                name,
                def_id,
                declared_ty,
                value,
            },
        ))
    }
}
