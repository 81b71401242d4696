use log::trace;

use crate::ast::{BinaryOperator, Expression, Program, Statement};
use crate::config::Config;
use crate::globals::GLOBAL_SLOTS;

mod error;

pub use error::{CodeGenError, CodeGenResult};

/// One-byte instruction codes. `IFETCH`, `ISTORE`, `IPUSH`, `JZ`, `JNZ` and
/// `JMP` are followed by a signed byte operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    IFetch = 0,
    IStore = 1,
    IPush = 2,
    IPop = 3,
    IAdd = 4,
    ISub = 5,
    ILt = 6,
    Jz = 7,
    Jnz = 8,
    Jmp = 9,
    Halt = 10,
}

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::IFetch,
        Opcode::IStore,
        Opcode::IPush,
        Opcode::IPop,
        Opcode::IAdd,
        Opcode::ISub,
        Opcode::ILt,
        Opcode::Jz,
        Opcode::Jnz,
        Opcode::Jmp,
        Opcode::Halt,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::IFetch => "IFETCH",
            Opcode::IStore => "ISTORE",
            Opcode::IPush => "IPUSH",
            Opcode::IPop => "IPOP",
            Opcode::IAdd => "IADD",
            Opcode::ISub => "ISUB",
            Opcode::ILt => "ILT",
            Opcode::Jz => "JZ",
            Opcode::Jnz => "JNZ",
            Opcode::Jmp => "JMP",
            Opcode::Halt => "HALT",
        }
    }

    pub fn has_operand(self) -> bool {
        matches!(
            self,
            Opcode::IFetch | Opcode::IStore | Opcode::IPush | Opcode::Jz | Opcode::Jnz | Opcode::Jmp
        )
    }

    pub fn is_branch(self) -> bool {
        matches!(self, Opcode::Jz | Opcode::Jnz | Opcode::Jmp)
    }
}

/// Bounded output buffer for generated code.
///
/// Its capacity is the whole memory budget; whatever code leaves free is
/// what the VM may use for its operand stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBuffer {
    code: Vec<u8>,
    capacity: usize,
}

impl CodeBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            code: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    fn emit(&mut self, byte: u8) -> CodeGenResult<usize> {
        if self.code.len() >= self.capacity {
            return Err(CodeGenError::BufferOverflow {
                capacity: self.capacity,
            });
        }
        self.code.push(byte);
        Ok(self.code.len() - 1)
    }

    fn emit_op(&mut self, opcode: Opcode) -> CodeGenResult<()> {
        self.emit(opcode as u8)?;
        Ok(())
    }

    fn emit_with_operand(&mut self, opcode: Opcode, operand: i8) -> CodeGenResult<()> {
        self.emit(opcode as u8)?;
        self.emit(operand as u8)?;
        Ok(())
    }

    /// Emits a branch with a zero offset and returns the offset byte's address.
    fn emit_placeholder(&mut self, opcode: Opcode) -> CodeGenResult<usize> {
        self.emit(opcode as u8)?;
        self.emit(0)
    }

    /// Points the placeholder at `offset_address` to the current end of code.
    fn patch_forward(&mut self, offset_address: usize) -> CodeGenResult<()> {
        let offset = relative_offset(offset_address, self.code.len())?;
        self.code[offset_address] = offset as u8;
        Ok(())
    }

    fn emit_backward(&mut self, opcode: Opcode, target: usize) -> CodeGenResult<()> {
        self.emit(opcode as u8)?;
        let offset = relative_offset(self.code.len(), target)?;
        self.emit(offset as u8)?;
        Ok(())
    }
}

/// Offset stored at `offset_address` so that a taken branch lands on `target`.
fn relative_offset(offset_address: usize, target: usize) -> CodeGenResult<i8> {
    let offset = target as isize - (offset_address as isize + 1);
    i8::try_from(offset).map_err(|_| CodeGenError::OffsetOutOfRange {
        offset,
        address: offset_address,
    })
}

/// Compiles a program into a fresh buffer sized by `config.memory_size`.
pub fn compile(program: &Program, config: &Config) -> CodeGenResult<CodeBuffer> {
    let mut out = CodeBuffer::new(config.memory_size);
    CodeGenerator::new(&mut out, config.max_depth).program(program)?;
    trace!("Generated {} bytes of code", out.len());
    Ok(out)
}

/// Appends the code for `program`, terminated by `HALT`, to `out`.
pub fn generate(program: &Program, out: &mut CodeBuffer) -> CodeGenResult<()> {
    CodeGenerator::new(out, Config::DEFAULT_MAX_DEPTH).program(program)
}

struct CodeGenerator<'a> {
    out: &'a mut CodeBuffer,
    depth: usize,
    max_depth: usize,
}

impl<'a> CodeGenerator<'a> {
    fn new(out: &'a mut CodeBuffer, max_depth: usize) -> Self {
        Self {
            out,
            depth: 0,
            max_depth,
        }
    }

    fn program(&mut self, program: &Program) -> CodeGenResult<()> {
        self.statement(&program.body)?;
        self.out.emit_op(Opcode::Halt)
    }

    fn statement(&mut self, statement: &Statement) -> CodeGenResult<()> {
        self.descend()?;
        match statement {
            Statement::IfThen {
                condition,
                then_branch,
            } => {
                self.expression(condition)?;
                let skip_then = self.out.emit_placeholder(Opcode::Jz)?;
                self.statement(then_branch)?;
                self.out.patch_forward(skip_then)?;
            }
            Statement::IfThenElse {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expression(condition)?;
                let to_else = self.out.emit_placeholder(Opcode::Jz)?;
                self.statement(then_branch)?;
                let to_end = self.out.emit_placeholder(Opcode::Jmp)?;
                self.out.patch_forward(to_else)?;
                self.statement(else_branch)?;
                self.out.patch_forward(to_end)?;
            }
            Statement::While { condition, body } => {
                let loop_start = self.out.len();
                self.expression(condition)?;
                let exit = self.out.emit_placeholder(Opcode::Jz)?;
                self.statement(body)?;
                self.out.emit_backward(Opcode::Jmp, loop_start)?;
                self.out.patch_forward(exit)?;
            }
            Statement::DoWhile { body, condition } => {
                let loop_start = self.out.len();
                self.statement(body)?;
                self.expression(condition)?;
                self.out.emit_backward(Opcode::Jnz, loop_start)?;
            }
            Statement::Expr(expr) => {
                self.expression(expr)?;
                self.out.emit_op(Opcode::IPop)?;
            }
            Statement::Sequence { .. } => {
                for item in statement.sequence_items() {
                    self.statement(item)?;
                }
            }
            Statement::Empty => {}
        }
        self.ascend();
        Ok(())
    }

    fn expression(&mut self, expr: &Expression) -> CodeGenResult<()> {
        self.descend()?;
        match expr {
            Expression::Constant(value) => {
                let operand = i8::try_from(*value)
                    .map_err(|_| CodeGenError::ConstantOutOfRange { value: *value })?;
                self.out.emit_with_operand(Opcode::IPush, operand)?;
            }
            Expression::Variable(slot) => {
                self.out.emit_with_operand(Opcode::IFetch, slot_operand(*slot)?)?;
            }
            Expression::Assign { slot, value } => {
                self.expression(value)?;
                self.out.emit_with_operand(Opcode::IStore, slot_operand(*slot)?)?;
            }
            Expression::Binary { left, op, right } => {
                self.expression(left)?;
                self.expression(right)?;
                self.out.emit_op(match op {
                    BinaryOperator::Add => Opcode::IAdd,
                    BinaryOperator::Subtract => Opcode::ISub,
                    BinaryOperator::LessThan => Opcode::ILt,
                })?;
            }
        }
        self.ascend();
        Ok(())
    }

    fn descend(&mut self) -> CodeGenResult<()> {
        if self.depth >= self.max_depth {
            return Err(CodeGenError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }
}

fn slot_operand(slot: u8) -> CodeGenResult<i8> {
    if usize::from(slot) >= GLOBAL_SLOTS {
        return Err(CodeGenError::InvalidSlot { slot });
    }
    Ok(slot as i8)
}
