use thiserror::Error;

/// Typed errors produced by the tree-walking interpreter backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    #[error("Program nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error("Global slot {slot} is out of range")]
    InvalidSlot { slot: u8 },
}

pub type InterpreterResult<T> = std::result::Result<T, InterpreterError>;
