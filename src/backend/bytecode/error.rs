use thiserror::Error;

/// Typed errors produced while lowering the syntax tree into bytecode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeGenError {
    #[error("Branch offset {offset} at address {address} does not fit in a signed byte")]
    OffsetOutOfRange { offset: isize, address: usize },
    #[error("Generated code exceeds the {capacity}-byte memory")]
    BufferOverflow { capacity: usize },
    #[error("Constant {value} does not fit in a signed byte operand")]
    ConstantOutOfRange { value: i32 },
    #[error("Global slot {slot} is out of range")]
    InvalidSlot { slot: u8 },
    #[error("Program nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

pub type CodeGenResult<T> = Result<T, CodeGenError>;
