//! Top-level grammar: `spec.md` §4.1's program mode accepts zero or more
//! globals, each one of `TypeDef`, `Declaration`, `Impl`, or `Class`,
//! terminated by `;`.

use std::rc::Rc;

use lumen_ast::{Param, Stmt, StmtKind};
use lumen_lex::{Keyword, TokenKind};
use lumen_types::{Field, Type, TypeKind};
use lumen_util::Symbol;

use crate::error::{ParseError, ParseResult};
use crate::parser::{ImplClassContext, Parser};

impl<'a> Parser<'a> {
    pub(crate) fn parse_global(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind.clone() {
            TokenKind::Keyword(Keyword::Type) => self.parse_type_def(),
            TokenKind::Keyword(Keyword::Let) | TokenKind::Keyword(Keyword::Const) => {
                let stmt = self.parse_global_declaration()?;
                Ok(stmt)
            }
            TokenKind::Keyword(Keyword::Class) => self.parse_class(),
            TokenKind::Keyword(Keyword::Impl) => self.parse_impl(),
            _ => Err(ParseError::UnknownDeclarationForm {
                span: self.current_span(),
            }),
        }
    }

    fn parse_type_def(&mut self) -> ParseResult<Stmt> {
        let span = self.current_span();
        self.expect_kw(Keyword::Type)?;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let body = self.parse_type()?;
        self.expect_semicolon()?;

        let state = self.scope.redeclaration_state(name);
        if state == lumen_ast::Redeclaration::Redeclaration {
            return Err(ParseError::Redeclaration { name: name.to_string(), span });
        }
        let alias = self.types.unresolved_alias(name);
        self.types.resolve_alias(&alias, body);

        let def_id = self.next_def_id();
        let binding = lumen_ast::Binding::new(name, def_id, true);
        binding.ty.replace(Some(Rc::clone(&alias)));
        self.scope.add_member(binding);

        Ok(Stmt::new(
            span,
            StmtKind::TypeDef {
                name,
                def_id,
                alias_ty: alias,
            },
        ))
    }

    /// Top-level `let`/`const`, reusing the block-statement grammar;
    /// globals share the root scope so later globals can refer to
    /// earlier ones (and, via `Alias`, to later ones too — see
    /// `types.rs`'s forward-reference note).
    fn parse_global_declaration(&mut self) -> ParseResult<Stmt> {
        self.parse_stmt()
    }

    /// Parses `name: Type` member entries shared by class fields and
    /// impl members. Both require an explicit declared type at parse
    /// time (the struct/impl type is built eagerly so forward type
    /// references resolve, per `spec.md` §4.1 "Class / Impl rules").
    fn parse_member(&mut self) -> ParseResult<Param> {
        let (name, span) = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let default = if self.eat(TokenKind::Eq) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_semicolon()?;
        let def_id = self.next_def_id();
        Ok(Param {
            span,
            name,
            def_id,
            declared_ty: Some(ty),
            default,
        })
    }

    fn parse_class(&mut self) -> ParseResult<Stmt> {
        let span = self.current_span();
        self.expect_kw(Keyword::Class)?;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let was = self.in_impl_class;
        self.in_impl_class = ImplClassContext::Class;
        let (fields, _inner_env) = self.with_inner_scope(|p| {
            let mut fields = Vec::new();
            while !p.check(&TokenKind::RBrace) && !p.at_eof() {
                fields.push(p.parse_member()?);
            }
            ParseResult::Ok(fields)
        });
        self.in_impl_class = was;
        let fields = fields?;
        self.expect(TokenKind::RBrace)?;
        self.expect_semicolon()?;

        let state = self.scope.redeclaration_state(name);
        if state == lumen_ast::Redeclaration::Redeclaration {
            return Err(ParseError::Redeclaration { name: name.to_string(), span });
        }

        let struct_fields: Vec<Field> = fields
            .iter()
            .map(|p| Field {
                name: p.name,
                ty: p.declared_ty.clone().expect("class field requires a declared type"),
            })
            .collect();
        let struct_ty = Type::new(TypeKind::Struct(struct_fields));

        let def_id = self.next_def_id();
        let binding = lumen_ast::Binding::new(name, def_id, true);
        binding.ty.replace(Some(Rc::clone(&struct_ty)));
        self.scope.add_member(binding);

        Ok(Stmt::new(
            span,
            StmtKind::Class {
                name,
                def_id,
                fields,
                struct_ty,
            },
        ))
    }

    fn parse_impl(&mut self) -> ParseResult<Stmt> {
        let span = self.current_span();
        self.expect_kw(Keyword::Impl)?;
        let (name, name_span) = self.expect_ident()?;

        let decorating = if self.eat_kw(Keyword::For) {
            let (target, _) = self.expect_ident()?;
            Some(target)
        } else {
            None
        };

        self.expect(TokenKind::LBrace)?;
        let was = self.in_impl_class;
        self.in_impl_class = ImplClassContext::Impl;
        let (members, _inner_env) = self.with_inner_scope(|p| {
            let mut members = Vec::new();
            while !p.check(&TokenKind::RBrace) && !p.at_eof() {
                members.push(p.parse_member()?);
            }
            ParseResult::Ok(members)
        });
        self.in_impl_class = was;
        let members = members?;
        self.expect(TokenKind::RBrace)?;
        self.expect_semicolon()?;

        if let Some(target) = decorating {
            self.check_impl_for(name, name_span, target, &members)?;
        }

        let impl_fields: Vec<Field> = members
            .iter()
            .map(|p| Field {
                name: p.name,
                ty: p.declared_ty.clone().expect("impl member requires a declared type"),
            })
            .collect();
        let impl_ty = Type::new(TypeKind::Impl(impl_fields));

        let def_id = self.next_def_id();
        // Only the bare `impl NAME { ... }` interface form binds a type
        // name; `impl NAME for TARGET { ... }` decorates an existing
        // class and introduces no new name.
        if decorating.is_none() {
            let binding = lumen_ast::Binding::new(name, def_id, true);
            binding.ty.replace(Some(Rc::clone(&impl_ty)));
            self.scope.add_member(binding);
        }

        Ok(Stmt::new(
            span,
            StmtKind::Impl {
                name,
                def_id,
                decorating,
                members,
                impl_ty,
            },
        ))
    }

    /// `impl NAME for TARGET` requires `NAME` to already be a declared
    /// `Impl` and `TARGET` a declared `Class`; every member of the
    /// interface must appear exactly once and in the same declared order.
    fn check_impl_for(
        &self,
        name: Symbol,
        name_span: lumen_util::Span,
        target: Symbol,
        provided: &[Param],
    ) -> ParseResult<()> {
        let iface_binding = self.scope.get_member(name).ok_or(ParseError::UnexpectedToken {
            expected: format!("a previously declared `impl {name}`"),
            found: "an unknown name".into(),
            span: name_span,
        })?;
        let iface_ty = iface_binding
            .ty
            .borrow()
            .clone()
            .filter(|t| t.is_impl())
            .ok_or(ParseError::UnexpectedToken {
                expected: format!("`{name}` to name a declared interface"),
                found: "a non-interface name".into(),
                span: name_span,
            })?;
        let _ = self.scope.get_member(target).ok_or(ParseError::UnexpectedToken {
            expected: format!("a previously declared class `{target}`"),
            found: "an unknown name".into(),
            span: name_span,
        })?;

        let TypeKind::Impl(required) = &iface_ty.kind else {
            unreachable!("filtered to is_impl above");
        };
        if required.len() != provided.len() {
            return Err(ParseError::ImplArityMismatch {
                iface: name.to_string(),
                target: target.to_string(),
                expected: required.len(),
                found: provided.len(),
                span: name_span,
            });
        }
        for (req, got) in required.iter().zip(provided.iter()) {
            if req.name != got.name {
                return Err(ParseError::ImplMemberMismatch {
                    name: got.name.to_string(),
                    span: got.span,
                });
            }
        }
        Ok(())
    }
}
