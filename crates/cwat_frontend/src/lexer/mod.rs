
use std::str::Chars;

use cwat_interner::Interner;
use cwat_utils::peek::Peek;

use crate::token::*;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("unterminated character literal")]
    UnterminatedChar,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),

    #[error("malformed float literal")]
    MalformedFloat,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("unterminated block comment")]
    UnterminatedComment,
}

pub type LexerResult<T> = Result<T, LexerErrorKind>;

/// Position of the lexer in the source. Cheap to clone, used for speculative parsing.
#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    chars: Chars<'src>,
    line: usize,
}

/// Produces tokens on demand. Lookahead is done by lexing ahead and restoring the cursor.
pub struct Lexer<'src, 'int> {
    interner: &'int mut Interner,

    source: &'src str,
    cursor: Cursor<'src>,
}

impl<'src, 'int> Lexer<'src, 'int> {
    pub fn new(source: &'src str, interner: &'int mut Interner) -> Self {
        Self {
            interner,

            source,
            cursor: Cursor {
                chars: source.chars(),
                line: 1,
            },
        }
    }

    pub fn interner(&self) -> &Interner {
        self.interner
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Token {
        self.lex_token()
    }

    pub fn peek(&mut self) -> Token {
        self.peek_nth(0)
    }

    pub fn peek2(&mut self) -> Token {
        self.peek_nth(1)
    }

    pub fn peek3(&mut self) -> Token {
        self.peek_nth(2)
    }

    pub fn snapshot(&self) -> Cursor<'src> {
        self.cursor.clone()
    }

    pub fn restore(&mut self, cursor: Cursor<'src>) {
        self.cursor = cursor;
    }

    /// Text of the given 1-based line, or an empty string if there is no such line.
    pub fn source_line(&self, line: usize) -> &'src str {
        line.checked_sub(1)
            .and_then(|index| self.source.lines().nth(index))
            .unwrap_or_default()
    }

    fn peek_nth(&mut self, n: usize) -> Token {
        let snapshot = self.snapshot();

        let mut token = self.lex_token();
        for _ in 0..n {
            token = self.lex_token();
        }

        self.restore(snapshot);
        token
    }

    fn lex_token(&mut self) -> Token {
        loop {
            let line = self.cursor.line;

            let Some(ch) = self.cursor.chars.next() else {
                return Token {
                    kind: TokenKind::Eof,
                    line,
                };
            };

            let kind = match ch {
                '\n' => {
                    self.cursor.line += 1;
                    continue;
                }

                ch if ch.is_ascii_whitespace() => continue,

                // comments
                '/' if self.cursor.chars.eat('/') => {
                    while !matches!(self.cursor.chars.peek(), Some('\n') | None) {
                        self.cursor.chars.next();
                    }
                    continue;
                }
                '/' if self.cursor.chars.eat('*') => match self.skip_block_comment() {
                    Ok(()) => continue,
                    Err(err) => TokenKind::Error(err),
                },

                ';' => TokenKind::Semicolon,
                ',' => TokenKind::Comma,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,

                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,

                '!' if self.cursor.chars.eat('=') => TokenKind::BangEq,
                '!' => TokenKind::Bang,
                '&' if self.cursor.chars.eat('&') => TokenKind::AmpAmp,
                '&' => TokenKind::Amp,
                '|' if self.cursor.chars.eat('|') => TokenKind::PipePipe,
                '|' => TokenKind::Pipe,

                '=' if self.cursor.chars.eat('=') => TokenKind::EqEq,
                '=' => TokenKind::Eq,
                '<' if self.cursor.chars.eat('=') => TokenKind::LtEq,
                '<' => TokenKind::Lt,
                '>' if self.cursor.chars.eat('=') => TokenKind::GtEq,
                '>' => TokenKind::Gt,

                '\'' => self.lex_char().unwrap_or_else(TokenKind::Error),

                ch @ '0'..='9' => self.lex_number(ch).unwrap_or_else(TokenKind::Error),

                ch if is_ident_start(ch) => self.lex_alpha(ch),

                ch => TokenKind::Error(LexerErrorKind::UnexpectedChar(ch)),
            };

            return Token { kind, line };
        }
    }

    fn skip_block_comment(&mut self) -> LexerResult<()> {
        loop {
            match self.cursor.chars.next() {
                Some('*') if self.cursor.chars.eat('/') => return Ok(()),
                Some('\n') => self.cursor.line += 1,
                Some(_) => {}
                None => return Err(LexerErrorKind::UnterminatedComment),
            }
        }
    }

    fn lex_char(&mut self) -> LexerResult<TokenKind> {
        let ch = match self.cursor.chars.next() {
            Some('\\') => match self.cursor.chars.next() {
                Some('n') => '\n',
                Some('r') => '\r',
                Some('0') => '\0',
                Some('\\') => '\\',
                Some('\n') | None => return Err(LexerErrorKind::UnterminatedChar),
                Some(other) => return Err(LexerErrorKind::InvalidEscape(other)),
            },
            Some('\n' | '\'') | None => return Err(LexerErrorKind::UnterminatedChar),
            Some(ch) => ch,
        };

        if !self.cursor.chars.eat('\'') {
            return Err(LexerErrorKind::UnterminatedChar);
        }

        Ok(TokenKind::Integer(ch as i32))
    }

    fn lex_number(&mut self, first: char) -> LexerResult<TokenKind> {
        let mut s = String::from(first);
        let mut dots = 0;

        while let Some(ch @ ('0'..='9' | '.')) = self.cursor.chars.peek() {
            self.cursor.chars.next();

            if ch == '.' {
                dots += 1;
            }
            s.push(ch);
        }

        match dots {
            0 => s
                .parse()
                .map(TokenKind::Integer)
                .map_err(|_| LexerErrorKind::IntegerOverflow),
            1 => s
                .parse()
                .map(TokenKind::Float)
                .map_err(|_| LexerErrorKind::MalformedFloat),
            _ => Err(LexerErrorKind::MalformedFloat),
        }
    }

    fn lex_alpha(&mut self, first: char) -> TokenKind {
        let mut s = String::from(first);

        while let Some(ch) = self.cursor.chars.peek().filter(|&ch| is_ident(ch)) {
            self.cursor.chars.next();
            s.push(ch);
        }

        match s.as_str() {
            "while" => TokenKind::Keyword(Keyword::While),
            "if" => TokenKind::Keyword(Keyword::If),
            "else" => TokenKind::Keyword(Keyword::Else),
            "break" => TokenKind::Keyword(Keyword::Break),
            "continue" => TokenKind::Keyword(Keyword::Continue),
            "return" => TokenKind::Keyword(Keyword::Return),
            "extern" => TokenKind::Keyword(Keyword::Extern),
            "void" => TokenKind::Keyword(Keyword::Void),
            "int" => TokenKind::Keyword(Keyword::Int),
            "float" => TokenKind::Keyword(Keyword::Float),
            _ => TokenKind::Identifier(self.interner.intern(&s)),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
