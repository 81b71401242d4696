use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at line {line}, column {column}")]
    UnexpectedCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error(
        "Invalid identifier '{identifier}' at line {line}, column {column}: only single lowercase letters are allowed"
    )]
    InvalidIdentifier {
        identifier: String,
        line: usize,
        column: usize,
    },
    #[error("Identifier longer than {limit} letters at line {line}, column {column}")]
    IdentifierTooLong {
        limit: usize,
        line: usize,
        column: usize,
    },
    #[error("Integer literal '{literal}' does not fit in 32 bits at line {line}, column {column}")]
    IntegerTooLarge {
        literal: String,
        line: usize,
        column: usize,
    },
}

pub type LexResult<T> = Result<T, LexError>;
