//! The scanner: source text to `Token` stream, one `next_token` call at a
//! time.
//!
//! Grounded on the teacher's `faxc-lex/src/lexer/core.rs` direct-coded
//! character dispatch (`match self.cursor.current()`), narrowed to the
//! closed token set of `spec.md` §6 — no raw strings, no `async`/`await`,
//! no unicode identifier continuation beyond ASCII, which this language's
//! grammar never uses.

use lumen_util::{FileId, Span};

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::{Keyword, Token, TokenKind};

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    file: FileId,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: FileId) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            file,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    /// Tokenizes the whole source. Fail-fast: the first lexical error
    /// halts tokenization (`spec.md` §7).
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let eof = tok.is_eof();
            tokens.push(tok);
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn span(&self, start: usize, line: u32, column: u32) -> Span {
        Span::new(self.file, start as u32, self.cursor.position() as u32, line, column)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current() {
                ' ' | '\t' | '\r' | '\n' => self.cursor.advance(),
                '/' if self.cursor.peek(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current() != '\n' {
                        self.cursor.advance();
                    }
                }
                '/' if self.cursor.peek(1) == '*' => {
                    self.cursor.advance();
                    self.cursor.advance();
                    while !self.cursor.is_at_end()
                        && !(self.cursor.current() == '*' && self.cursor.peek(1) == '/')
                    {
                        self.cursor.advance();
                    }
                    if !self.cursor.is_at_end() {
                        self.cursor.advance();
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments();

        let start = self.cursor.position();
        let line = self.cursor.line();
        let column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(Token::new(TokenKind::Eof, self.span(start, line, column)));
        }

        let c = self.cursor.current();
        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            '+' => self.single(TokenKind::Plus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '%' => self.single(TokenKind::Percent),
            '^' => self.single(TokenKind::Caret),
            '-' => self.lex_minus(),
            '.' => self.lex_dot(),
            '<' => self.lex_lt(),
            '>' => self.lex_gt(),
            '=' => self.lex_eq(),
            '!' => self.lex_bang(),
            '&' => self.lex_amp(),
            '|' => self.lex_pipe(),
            '"' => return self.lex_string(start, line, column),
            '\'' => return self.lex_char(start, line, column),
            c if c.is_ascii_digit() => return self.lex_number(start, line, column),
            c if is_ident_start(c) => return self.lex_ident(start, line, column),
            other => {
                let span = self.span_to_here(start, line, column, 1);
                let err = LexError::UnexpectedChar { found: other, span };
                self.cursor.advance();
                self.errors.push(err.clone());
                return Err(err);
            }
        };
        Ok(Token::new(kind, self.span(start, line, column)))
    }

    fn span_to_here(&self, start: usize, line: u32, column: u32, width: usize) -> Span {
        Span::new(self.file, start as u32, (start + width) as u32, line, column)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance();
        kind
    }

    fn lex_minus(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.current() == '>' {
            self.cursor.advance();
            TokenKind::Arrow
        } else {
            TokenKind::Minus
        }
    }

    fn lex_dot(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.current() == '.' {
            self.cursor.advance();
            if self.cursor.current() == '=' {
                self.cursor.advance();
                TokenKind::DotDotEq
            } else {
                TokenKind::DotDot
            }
        } else {
            TokenKind::Dot
        }
    }

    fn lex_lt(&mut self) -> TokenKind {
        self.cursor.advance();
        match self.cursor.current() {
            '<' => {
                self.cursor.advance();
                TokenKind::Shl
            }
            '=' => {
                self.cursor.advance();
                TokenKind::Le
            }
            _ => TokenKind::Lt,
        }
    }

    fn lex_gt(&mut self) -> TokenKind {
        self.cursor.advance();
        match self.cursor.current() {
            '>' => {
                self.cursor.advance();
                TokenKind::Shr
            }
            '=' => {
                self.cursor.advance();
                TokenKind::Ge
            }
            _ => TokenKind::Gt,
        }
    }

    fn lex_eq(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.current() == '=' {
            self.cursor.advance();
            TokenKind::EqEq
        } else {
            TokenKind::Eq
        }
    }

    fn lex_bang(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.current() == '=' {
            self.cursor.advance();
            TokenKind::Ne
        } else {
            TokenKind::Bang
        }
    }

    fn lex_amp(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.current() == '&' {
            self.cursor.advance();
            TokenKind::AmpAmp
        } else {
            TokenKind::Amp
        }
    }

    fn lex_pipe(&mut self) -> TokenKind {
        self.cursor.advance();
        if self.cursor.current() == '|' {
            self.cursor.advance();
            TokenKind::PipePipe
        } else {
            TokenKind::Pipe
        }
    }

    fn lex_ident(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        while is_ident_continue(self.cursor.current()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice(start, self.cursor.position());
        let span = self.span(start, line, column);
        let kind = match Keyword::lookup(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(lumen_util::Symbol::intern(text)),
        };
        Ok(Token::new(kind, span))
    }

    fn lex_number(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }
        let mut is_float = false;
        if self.cursor.current() == '.' && self.cursor.peek(1).is_ascii_digit() {
            is_float = true;
            self.cursor.advance();
            while self.cursor.current().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        if matches!(self.cursor.current(), 'e' | 'E') {
            let save = self.cursor.position();
            let mut lookahead = 1;
            if matches!(self.cursor.peek(1), '+' | '-') {
                lookahead += 1;
            }
            if self.cursor.peek(lookahead).is_ascii_digit() {
                is_float = true;
                for _ in 0..=lookahead {
                    self.cursor.advance();
                }
                while self.cursor.current().is_ascii_digit() {
                    self.cursor.advance();
                }
            } else {
                let _ = save;
            }
        }
        let text = self.cursor.slice(start, self.cursor.position());
        let span = self.span(start, line, column);
        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| LexError::MalformedNumber { span })?;
            Ok(Token::new(TokenKind::Float(value), span))
        } else {
            let value: i32 = text
                .parse()
                .map_err(|_| LexError::MalformedNumber { span })?;
            Ok(Token::new(TokenKind::Int(value), span))
        }
    }

    fn lex_string(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // opening quote
        let mut bytes = Vec::new();
        loop {
            if self.cursor.is_at_end() {
                let span = self.span(start, line, column);
                return Err(LexError::UnterminatedString { span });
            }
            match self.cursor.current() {
                '"' => {
                    self.cursor.advance();
                    break;
                }
                '\\' => bytes.push(self.lex_escape(start, line, column)?),
                c => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    self.cursor.advance();
                }
            }
        }
        let span = self.span(start, line, column);
        Ok(Token::new(TokenKind::Str(bytes), span))
    }

    fn lex_char(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // opening quote
        if self.cursor.current() == '\'' {
            let span = self.span(start, line, column);
            return Err(LexError::EmptyChar { span });
        }
        let value = if self.cursor.current() == '\\' {
            self.lex_escape(start, line, column)?
        } else {
            let c = self.cursor.current();
            self.cursor.advance();
            c as u8
        };
        if self.cursor.current() != '\'' {
            let span = self.span(start, line, column);
            return Err(LexError::UnterminatedChar { span });
        }
        self.cursor.advance();
        let span = self.span(start, line, column);
        Ok(Token::new(TokenKind::Char(value), span))
    }

    /// Decodes one `\x` escape sequence, per the closed escape set of
    /// `spec.md` §6: `\a\b\f\n\r\t\v\'\"\?\\` plus `\xHH`.
    fn lex_escape(&mut self, start: usize, line: u32, column: u32) -> Result<u8, LexError> {
        self.cursor.advance(); // the backslash
        let c = self.cursor.current();
        let byte = match c {
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0c,
            'n' => b'\n',
            'r' => b'\r',
            't' => b'\t',
            'v' => 0x0b,
            '\'' => b'\'',
            '"' => b'"',
            '?' => b'?',
            '\\' => b'\\',
            'x' => {
                self.cursor.advance();
                let hi = self.cursor.current();
                self.cursor.advance();
                let lo = self.cursor.current();
                let span = self.span(start, line, column);
                let hi = hi.to_digit(16).ok_or(LexError::MalformedHexEscape { span })?;
                let lo = lo.to_digit(16).ok_or(LexError::MalformedHexEscape { span })?;
                self.cursor.advance();
                return Ok(((hi << 4) | lo) as u8);
            }
            other => {
                let span = self.span(start, line, column);
                return Err(LexError::InvalidEscape { escape: other, span });
            }
        };
        self.cursor.advance();
        Ok(byte)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, FileId::ROOT)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_are_recognized() {
        let kinds = lex("let const fn class impl type case match if else for while in return yield continue self true false void optional list");
        let expected: Vec<TokenKind> = [
            Keyword::Let,
            Keyword::Const,
            Keyword::Fn,
            Keyword::Class,
            Keyword::Impl,
            Keyword::Type,
            Keyword::Case,
            Keyword::Match,
            Keyword::If,
            Keyword::Else,
            Keyword::For,
            Keyword::While,
            Keyword::In,
            Keyword::Return,
            Keyword::Yield,
            Keyword::Continue,
            Keyword::SelfKw,
            Keyword::True,
            Keyword::False,
            Keyword::Void,
            Keyword::Optional,
            Keyword::List,
        ]
        .into_iter()
        .map(TokenKind::Keyword)
        .collect();
        assert_eq!(&kinds[..kinds.len() - 1], &expected[..]);
    }

    #[test]
    fn multi_char_operators_maximal_munch() {
        let kinds = lex("<= >= == != << >> && || -> .. ..=");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::Shl,
                TokenKind::Shr,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Arrow,
                TokenKind::DotDot,
                TokenKind::DotDotEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_and_float_literals() {
        let kinds = lex("42 3.14 2e3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int(42),
                TokenKind::Float(3.14),
                TokenKind::Float(2000.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_literal_with_escapes() {
        let kinds = lex(r#""a\nb\x41""#);
        assert_eq!(kinds, vec![TokenKind::Str(b"a\nbA".to_vec()), TokenKind::Eof]);
    }

    #[test]
    fn char_literal() {
        let kinds = lex(r"'a' '\n' '\x41'");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Char(b'a'),
                TokenKind::Char(b'\n'),
                TokenKind::Char(0x41),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("\"abc", FileId::ROOT);
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn line_and_block_comments_are_skipped() {
        let kinds = lex("1 // comment\n/* block */ 2");
        assert_eq!(kinds, vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]);
    }

    #[test]
    fn identifiers_and_underscores() {
        let kinds = lex("foo_bar _baz");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident(lumen_util::Symbol::intern("foo_bar")),
                TokenKind::Ident(lumen_util::Symbol::intern("_baz")),
                TokenKind::Eof,
            ]
        );
    }
}
