use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("Unknown opcode {opcode} at address {address}")]
    UnknownOpcode { opcode: u8, address: usize },
    #[error("Stack overflow at address {address}: code leaves room for {limit} cells")]
    StackOverflow { limit: usize, address: usize },
    #[error("Stack underflow at address {address}")]
    StackUnderflow { address: usize },
    #[error("Instruction pointer left the code region at address {address}")]
    CodeOutOfBounds { address: usize },
    #[error("Global slot {slot} is out of range at address {address}")]
    InvalidSlot { slot: i8, address: usize },
}

pub type VmResult<T> = std::result::Result<T, VmError>;
