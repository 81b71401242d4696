use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Global slot index, 0 for `a` through 25 for `z`.
    Ident(u8),
    Constant(i32),

    // Keywords
    Do,
    Else,
    If,
    While,

    // Operators
    Equal, // =
    Plus,  // +
    Minus, // -
    Less,  // <

    // Delimiters
    Semicolon, // ;
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }

    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(slot) => write!(f, "identifier '{}'", char::from(b'a' + slot)),
            TokenKind::Constant(value) => write!(f, "constant {value}"),
            TokenKind::Do => f.write_str("'do'"),
            TokenKind::Else => f.write_str("'else'"),
            TokenKind::If => f.write_str("'if'"),
            TokenKind::While => f.write_str("'while'"),
            TokenKind::Equal => f.write_str("'='"),
            TokenKind::Plus => f.write_str("'+'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::Less => f.write_str("'<'"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::End => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
