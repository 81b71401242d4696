use thiserror::Error;

use crate::lexer::LexError;
use crate::token::TokenKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Expected {expected}, found {found} at line {line}, column {column}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
        line: usize,
        column: usize,
    },
    #[error("Invalid assignment target at line {line}, column {column}: only a variable can be assigned")]
    InvalidAssignmentTarget { line: usize, column: usize },
    #[error("Program nests deeper than {limit} levels at line {line}, column {column}")]
    NestingTooDeep {
        limit: usize,
        line: usize,
        column: usize,
    },
}

pub type ParseResult<T> = Result<T, ParseError>;
