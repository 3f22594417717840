//! The parser core: token-cursor plumbing, context flags, and the three
//! entry points (`PROGRAM`, `EXPR`, `TYPE`) of `spec.md` §4.1.

use std::rc::Rc;

use lumen_ast::{Environment, Program};
use lumen_lex::{Keyword, Lexer, Token, TokenKind};
use lumen_types::{Bottom, Type, TypeContext};
use lumen_util::{DefId, DefIdGenerator, FileId, Span, Symbol};

use crate::error::{ParseError, ParseResult};

/// Which `impl`/`class` body (if any) encloses the parser's current
/// position, gating the legality of `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplClassContext {
    Normal,
    Impl,
    Class,
}

pub struct Parser<'a> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) types: &'a TypeContext,
    pub(crate) ids: &'a mut DefIdGenerator,
    pub(crate) scope: Rc<Environment>,

    pub(crate) in_impl_class: ImplClassContext,
    pub(crate) in_loop: bool,
    pub(crate) in_block: bool,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &str,
        file: FileId,
        types: &'a TypeContext,
        ids: &'a mut DefIdGenerator,
    ) -> ParseResult<Self> {
        let tokens = Lexer::new(source, file).tokenize()?;
        let scope = build_root_environment(types);
        Ok(Parser {
            tokens,
            pos: 0,
            types,
            ids,
            scope,
            in_impl_class: ImplClassContext::Normal,
            in_loop: false,
            in_block: false,
        })
    }

    /// `PROGRAM` mode: zero or more globals, each terminated by `;`.
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut globals = Vec::new();
        while !self.at_eof() {
            globals.push(self.parse_global()?);
        }
        Ok(Program {
            root: Rc::clone(&self.scope),
            globals,
        })
    }

    /// `EXPR` mode: one expression, stored by the driver as `$TypeCheckerExpr`.
    pub fn parse_expr_entry(&mut self) -> ParseResult<lumen_ast::Expr> {
        let expr = self.parse_expr()?;
        self.expect_eof()?;
        Ok(expr)
    }

    /// `TYPE` mode: one type, stored by the driver as `$TypeCheckerType`.
    pub fn parse_type_entry(&mut self) -> ParseResult<Rc<Type>> {
        let ty = self.parse_type()?;
        self.expect_eof()?;
        Ok(ty)
    }

    // -- token cursor -------------------------------------------------

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.peek().is_eof()
    }

    pub(crate) fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    pub(crate) fn check_kw(&self, kw: Keyword) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(k) if *k == kw)
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_kw(&mut self, kw: Keyword) -> bool {
        if self.check_kw(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(&kind) {
            Ok(self.bump())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: kind.describe(),
                found: self.peek().kind.describe(),
                span: self.current_span(),
            })
        }
    }

    pub(crate) fn expect_kw(&mut self, kw: Keyword) -> ParseResult<Token> {
        self.expect(TokenKind::Keyword(kw))
    }

    pub(crate) fn expect_semicolon(&mut self) -> ParseResult<()> {
        if self.eat(TokenKind::Semicolon) {
            Ok(())
        } else {
            Err(ParseError::MissingSemicolon {
                span: self.current_span(),
            })
        }
    }

    pub(crate) fn expect_eof(&mut self) -> ParseResult<()> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "end of input".into(),
                found: self.peek().kind.describe(),
                span: self.current_span(),
            })
        }
    }

    pub(crate) fn expect_ident(&mut self) -> ParseResult<(Symbol, Span)> {
        let span = self.current_span();
        match self.peek().kind.clone() {
            TokenKind::Ident(s) => {
                self.bump();
                Ok((s, span))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "identifier".into(),
                found: other.describe(),
                span,
            }),
        }
    }

    pub(crate) fn next_def_id(&mut self) -> DefId {
        self.ids.next()
    }

    /// Enters a fresh child scope for the duration of `f`, restoring the
    /// parser's current scope afterward. Mirrors "save-and-restore around
    /// recursive entries" (`spec.md` §9) but for the environment rather
    /// than a context flag.
    pub(crate) fn with_inner_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> (T, Rc<Environment>) {
        let parent = Rc::clone(&self.scope);
        self.scope = parent.generate_inner_environment();
        let inner = Rc::clone(&self.scope);
        let result = f(self);
        self.scope = parent;
        (result, inner)
    }
}

/// Seeds the root environment with the canonical primitive type names, so
/// that `int`, `char`, `bool`, `float` resolve by ordinary identifier
/// lookup per `spec.md` §4.1's "identifier types resolve by lookup"
/// (`void` and `self` are keywords recognized directly by `parse_type`).
fn build_root_environment(types: &TypeContext) -> Rc<Environment> {
    use lumen_ast::{Binding, BottomTypes};

    let bottoms = BottomTypes {
        void: types.void(),
        int: types.int(),
        bool_: types.bool_ty(),
        char_: types.char_ty(),
        float: types.float(),
        self_ref: types.self_ref(),
    };
    let root = Environment::root(bottoms);

    let mut seed = |name: &str, kind: Bottom| {
        let sym = Symbol::intern(name);
        let binding = Binding::new(sym, DefId::DUMMY, true);
        binding.ty.replace(Some(types.bottom(kind)));
        root.add_member(binding);
    };
    seed("int", Bottom::Int);
    seed("char", Bottom::Char);
    seed("bool", Bottom::Bool);
    seed("float", Bottom::Float);

    root
}
