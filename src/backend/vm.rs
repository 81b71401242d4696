use anyhow::Result;
use log::{debug, trace};

use crate::ast::Program;
use crate::backend::bytecode::{CodeBuffer, CodeGenResult, Opcode, compile};
use crate::backend::{Backend, PreparedBackend};
use crate::config::Config;
use crate::globals::Globals;

mod error;

pub use error::{VmError, VmResult};

/// Stack machine executing generated bytecode.
///
/// Code and stack share `config.memory_size`: the operand stack may hold at
/// most as many cells as the code leaves free.
pub struct VM {
    config: Config,
    stack: Vec<i32>,
    peak_depth: usize,
}

pub struct PreparedVM {
    code: CodeBuffer,
    config: Config,
}

impl PreparedVM {
    pub fn code(&self) -> &CodeBuffer {
        &self.code
    }
}

impl VM {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            stack: Vec::new(),
            peak_depth: 0,
        }
    }

    /// Generates code for `program` within this VM's memory budget.
    pub fn compile(&self, program: &Program) -> CodeGenResult<PreparedVM> {
        Ok(PreparedVM {
            code: compile(program, &self.config)?,
            config: self.config,
        })
    }

    /// Runs `code` against freshly zeroed globals.
    pub fn run_compiled(&mut self, code: &[u8]) -> VmResult<Globals> {
        let mut globals = Globals::new();
        self.execute(code, &mut globals)?;
        Ok(globals)
    }

    /// Cells left on the stack by the last run.
    ///
    /// `JZ`/`JNZ` leave the tested value in place, so every evaluated
    /// condition adds one cell here.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Deepest the stack grew during the last run.
    pub fn peak_stack_depth(&self) -> usize {
        self.peak_depth
    }

    pub fn execute(&mut self, code: &[u8], globals: &mut Globals) -> VmResult<()> {
        self.stack.clear();
        self.peak_depth = 0;
        let limit = self.config.memory_size.saturating_sub(code.len());
        debug!("Executing {} bytes of code with room for {limit} stack cells", code.len());

        let mut ip = 0;
        loop {
            let address = ip;
            let byte = *code
                .get(ip)
                .ok_or(VmError::CodeOutOfBounds { address })?;
            ip += 1;
            let opcode =
                Opcode::from_byte(byte).ok_or(VmError::UnknownOpcode { opcode: byte, address })?;

            match opcode {
                Opcode::IFetch => {
                    let slot = fetch_operand(code, &mut ip)?;
                    let value = slot_index(slot)
                        .and_then(|slot| globals.get(slot))
                        .ok_or(VmError::InvalidSlot { slot, address })?;
                    self.push(value, limit, address)?;
                }
                Opcode::IStore => {
                    let slot = fetch_operand(code, &mut ip)?;
                    let value = self.top(address)?;
                    let stored = slot_index(slot).is_some_and(|slot| globals.set(slot, value));
                    if !stored {
                        return Err(VmError::InvalidSlot { slot, address });
                    }
                }
                Opcode::IPush => {
                    let value = fetch_operand(code, &mut ip)?;
                    self.push(i32::from(value), limit, address)?;
                }
                Opcode::IPop => {
                    self.pop(address)?;
                }
                Opcode::IAdd => {
                    let right = self.pop(address)?;
                    let left = self.pop(address)?;
                    self.push(left.wrapping_add(right), limit, address)?;
                }
                Opcode::ISub => {
                    let right = self.pop(address)?;
                    let left = self.pop(address)?;
                    self.push(left.wrapping_sub(right), limit, address)?;
                }
                Opcode::ILt => {
                    let right = self.pop(address)?;
                    let left = self.pop(address)?;
                    self.push(i32::from(left < right), limit, address)?;
                }
                Opcode::Jz => {
                    let offset = fetch_operand(code, &mut ip)?;
                    if self.top(address)? == 0 {
                        ip = branch(ip, offset, address)?;
                    }
                }
                Opcode::Jnz => {
                    let offset = fetch_operand(code, &mut ip)?;
                    if self.top(address)? != 0 {
                        ip = branch(ip, offset, address)?;
                    }
                }
                Opcode::Jmp => {
                    let offset = fetch_operand(code, &mut ip)?;
                    ip = branch(ip, offset, address)?;
                }
                Opcode::Halt => {
                    trace!(
                        "Halted at address {address} with {} residual stack cells",
                        self.stack.len()
                    );
                    return Ok(());
                }
            }
        }
    }

    fn push(&mut self, value: i32, limit: usize, address: usize) -> VmResult<()> {
        if self.stack.len() >= limit {
            return Err(VmError::StackOverflow { limit, address });
        }
        self.stack.push(value);
        self.peak_depth = self.peak_depth.max(self.stack.len());
        Ok(())
    }

    fn pop(&mut self, address: usize) -> VmResult<i32> {
        self.stack.pop().ok_or(VmError::StackUnderflow { address })
    }

    fn top(&self, address: usize) -> VmResult<i32> {
        self.stack
            .last()
            .copied()
            .ok_or(VmError::StackUnderflow { address })
    }
}

/// Reads the signed operand byte at `ip` and steps past it.
fn fetch_operand(code: &[u8], ip: &mut usize) -> VmResult<i8> {
    let operand = *code
        .get(*ip)
        .ok_or(VmError::CodeOutOfBounds { address: *ip })?;
    *ip += 1;
    Ok(operand as i8)
}

/// `ip` already points past the offset byte.
fn branch(ip: usize, offset: i8, address: usize) -> VmResult<usize> {
    ip.checked_add_signed(isize::from(offset))
        .ok_or(VmError::CodeOutOfBounds { address })
}

fn slot_index(slot: i8) -> Option<u8> {
    u8::try_from(slot).ok()
}

impl Backend for VM {
    fn name(&self) -> &'static str {
        "vm"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(self.compile(program)?))
    }
}

impl PreparedBackend for PreparedVM {
    fn run(&self) -> Result<Globals> {
        let mut vm = VM::with_config(self.config);
        Ok(vm.run_compiled(self.code.as_bytes())?)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}
