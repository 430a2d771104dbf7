use cwat_interner::Istr;

use crate::lexer::LexerErrorKind;
use crate::NodeCopy;

#[derive(NodeCopy!)]
pub struct Token {
    pub kind: TokenKind,

    /// 1-based line the token starts on.
    pub line: usize,
}

#[derive(NodeCopy!)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier(Istr),
    Integer(i32),
    Float(f32),

    Semicolon,
    Comma,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,

    Plus,
    Minus,
    Star,
    Slash,

    Bang,
    BangEq,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,

    Eq,
    EqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    Error(LexerErrorKind),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    While,
    If,
    Else,
    Break,
    Continue,
    Return,
    Extern,

    Void,
    Int,
    Float,
}

impl TokenKind {
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            Self::Keyword(Keyword::Void | Keyword::Int | Keyword::Float)
        )
    }

    pub fn token_name(&self) -> &'static str {
        match self {
            Self::Keyword(kw) => match kw {
                Keyword::While => "keyword `while`",
                Keyword::If => "keyword `if`",
                Keyword::Else => "keyword `else`",
                Keyword::Break => "keyword `break`",
                Keyword::Continue => "keyword `continue`",
                Keyword::Return => "keyword `return`",
                Keyword::Extern => "keyword `extern`",
                Keyword::Void => "keyword `void`",
                Keyword::Int => "keyword `int`",
                Keyword::Float => "keyword `float`",
            },
            Self::Identifier(_) => "identifier",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Semicolon => "`;`",
            Self::Comma => "`,`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::Bang => "`!`",
            Self::BangEq => "`!=`",
            Self::Amp => "`&`",
            Self::AmpAmp => "`&&`",
            Self::Pipe => "`|`",
            Self::PipePipe => "`||`",
            Self::Eq => "`=`",
            Self::EqEq => "`==`",
            Self::Lt => "`<`",
            Self::LtEq => "`<=`",
            Self::Gt => "`>`",
            Self::GtEq => "`>=`",
            Self::Error(_) => "invalid token",
            Self::Eof => "end of file",
        }
    }
}
