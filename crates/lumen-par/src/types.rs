//! Type grammar (`spec.md` §4.1 "Type parser").
//!
//! ```text
//! sum_type     := product_type ("|" product_type)*
//! product_type := "fn" "(" (type ("," type)*)? ")" "->" type
//!               | "list" "[" ("*" | INT) "," type "]"
//!               | "optional" "[" type "]"
//!               | "(" type ("," type)* ","? ")"
//!               | "self" | "void"
//!               | IDENT
//! ```

use std::rc::Rc;

use lumen_lex::{Keyword, TokenKind};
use lumen_types::{Type, TypeKind};

use crate::error::{ParseError, ParseResult};
use crate::parser::Parser;

impl<'a> Parser<'a> {
    pub fn parse_type(&mut self) -> ParseResult<Rc<Type>> {
        let mut ty = self.parse_product_type()?;
        if self.check(&TokenKind::Pipe) {
            let mut branches = vec![ty];
            while self.eat(TokenKind::Pipe) {
                branches.push(self.parse_product_type()?);
            }
            ty = Type::new(TypeKind::Sum(branches));
        }
        Ok(ty)
    }

    fn parse_product_type(&mut self) -> ParseResult<Rc<Type>> {
        match self.peek().kind.clone() {
            TokenKind::Keyword(Keyword::Fn) => self.parse_function_type(),
            TokenKind::Keyword(Keyword::List) => self.parse_list_type(),
            TokenKind::Keyword(Keyword::Optional) => self.parse_optional_type(),
            TokenKind::Keyword(Keyword::SelfKw) => {
                self.bump();
                Ok(self.types.self_ref())
            }
            TokenKind::Keyword(Keyword::Void) => {
                self.bump();
                Ok(self.types.void())
            }
            TokenKind::LParen => self.parse_tuple_type(),
            TokenKind::Ident(name) => {
                self.bump();
                Ok(self.resolve_named_type(name))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "a type".into(),
                found: other.describe(),
                span: self.current_span(),
            }),
        }
    }

    fn parse_function_type(&mut self) -> ParseResult<Rc<Type>> {
        self.expect_kw(Keyword::Fn)?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.parse_type()?);
            while self.eat(TokenKind::Comma) {
                if self.check(&TokenKind::RParen) {
                    break;
                }
                params.push(self.parse_type()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let ret = self.parse_type()?;
        Ok(Type::new(TypeKind::Function { params, ret }))
    }

    fn parse_list_type(&mut self) -> ParseResult<Rc<Type>> {
        self.expect_kw(Keyword::List)?;
        self.expect(TokenKind::LBracket)?;
        let size = if self.eat(TokenKind::Star) {
            -1
        } else {
            match self.peek().kind.clone() {
                TokenKind::Int(n) => {
                    self.bump();
                    n as i64
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "`*` or an integer size".into(),
                        found: other.describe(),
                        span: self.current_span(),
                    })
                }
            }
        };
        self.expect(TokenKind::Comma)?;
        let elem = self.parse_type()?;
        self.expect(TokenKind::RBracket)?;
        Ok(Type::new(TypeKind::List(size, elem)))
    }

    fn parse_optional_type(&mut self) -> ParseResult<Rc<Type>> {
        self.expect_kw(Keyword::Optional)?;
        self.expect(TokenKind::LBracket)?;
        let inner = self.parse_type()?;
        self.expect(TokenKind::RBracket)?;
        Ok(self.types.optional(inner))
    }

    /// `(T)` is just `T`; `(T, U, ...)` (trailing comma allowed) is a
    /// tuple.
    fn parse_tuple_type(&mut self) -> ParseResult<Rc<Type>> {
        self.expect(TokenKind::LParen)?;
        if self.eat(TokenKind::RParen) {
            return Ok(Type::new(TypeKind::Tuple(Vec::new())));
        }
        let mut parts = vec![self.parse_type()?];
        let mut saw_comma = false;
        while self.eat(TokenKind::Comma) {
            saw_comma = true;
            if self.check(&TokenKind::RParen) {
                break;
            }
            parts.push(self.parse_type()?);
        }
        self.expect(TokenKind::RParen)?;
        if saw_comma {
            Ok(Type::new(TypeKind::Tuple(parts)))
        } else {
            Ok(parts.pop().unwrap())
        }
    }

    /// Looks `name` up in the current scope. A `type`/`class`/`impl`
    /// declaration binds its name directly to the type it defines; an
    /// unbound name (including a forward reference to a global declared
    /// later in the source) yields an unresolved `Alias` for the
    /// elaborator to bind once the whole program has been parsed.
    fn resolve_named_type(&self, name: lumen_util::Symbol) -> Rc<Type> {
        if let Some(binding) = self.scope.get_member(name) {
            if let Some(ty) = binding.ty.borrow().clone() {
                return ty;
            }
        }
        self.types.unresolved_alias(name)
    }
}
