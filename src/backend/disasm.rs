//! Human-readable listing of generated bytecode, for diagnostics only.

use std::fmt;

use crate::backend::bytecode::Opcode;
use crate::backend::vm::{VmError, VmResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLine {
    pub address: usize,
    pub opcode: Opcode,
    pub operand: Option<i8>,
    /// Absolute address a branch lands on when taken.
    pub target: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub lines: Vec<ListingLine>,
}

impl Listing {
    pub fn line_at(&self, address: usize) -> Option<&ListingLine> {
        self.lines.iter().find(|line| line.address == address)
    }

    pub fn branches(&self) -> impl Iterator<Item = &ListingLine> {
        self.lines.iter().filter(|line| line.opcode.is_branch())
    }
}

/// Decodes instructions from the start of `code` up to and including `HALT`.
pub fn disassemble(code: &[u8]) -> VmResult<Listing> {
    let mut lines = Vec::new();
    let mut ip = 0;
    loop {
        let address = ip;
        let byte = *code
            .get(ip)
            .ok_or(VmError::CodeOutOfBounds { address })?;
        let opcode =
            Opcode::from_byte(byte).ok_or(VmError::UnknownOpcode { opcode: byte, address })?;
        ip += 1;

        let mut line = ListingLine {
            address,
            opcode,
            operand: None,
            target: None,
        };
        if opcode.has_operand() {
            let operand = *code
                .get(ip)
                .ok_or(VmError::CodeOutOfBounds { address: ip })? as i8;
            ip += 1;
            line.operand = Some(operand);
            if opcode.is_branch() {
                line.target = Some(
                    ip.checked_add_signed(isize::from(operand))
                        .ok_or(VmError::CodeOutOfBounds { address })?,
                );
            }
        }
        lines.push(line);

        if opcode == Opcode::Halt {
            return Ok(Listing { lines });
        }
    }
}

impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}  {}", self.address, self.opcode.mnemonic())?;
        if let Some(operand) = self.operand {
            write!(f, " {operand}")?;
        }
        if let Some(target) = self.target {
            write!(f, " -> {target:04}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::bytecode::compile;
    use crate::config::Config;
    use crate::parser::parse;
    use indoc::indoc;

    fn listing(source: &str) -> Listing {
        let program = parse(source).expect("parse failed");
        let code = compile(&program, &Config::default()).expect("compile failed");
        disassemble(code.as_bytes()).expect("disassemble failed")
    }

    #[test]
    fn formats_instructions_and_targets() {
        let expected = indoc! {"
            0000  IFETCH 8
            0002  IPUSH 5
            0004  ILT
            0005  JZ 10 -> 0017
            0007  IFETCH 8
            0009  IPUSH 1
            0011  IADD
            0012  ISTORE 8
            0014  IPOP
            0015  JMP -17 -> 0000
            0017  HALT
        "};
        assert_eq!(listing("while (i<5) i=i+1;").to_string(), expected);
    }

    #[test]
    fn if_then_skips_exactly_the_body() {
        let listing = listing("if (a) { b=1; c=2; } d=3;");
        let jz = listing.branches().next().expect("missing JZ");
        assert_eq!(jz.opcode, Opcode::Jz);
        let landing = listing.line_at(jz.target.unwrap()).expect("target is an instruction");
        // First instruction after the block is `d=3`'s push.
        assert_eq!(landing.opcode, Opcode::IPush);
        assert_eq!(landing.operand, Some(3));
    }

    #[test]
    fn if_then_else_branches_land_after_each_arm() {
        let listing = listing("if (a) b=1; else b=2; c=3;");
        let branches: Vec<_> = listing.branches().copied().collect();
        assert_eq!(branches.len(), 2);
        let (jz, jmp) = (branches[0], branches[1]);

        // JZ lands on the first instruction of the else arm, right after the JMP.
        assert_eq!(jz.target, Some(jmp.address + 2));
        let else_start = listing.line_at(jz.target.unwrap()).unwrap();
        assert_eq!(else_start.operand, Some(2));

        let after = listing.line_at(jmp.target.unwrap()).unwrap();
        assert_eq!(after.operand, Some(3));
    }

    #[test]
    fn loops_branch_back_to_their_start() {
        let listing = listing("a=1; while (i<5) i=i+1; do j=j+1; while (j<2);");

        let jmp = listing
            .branches()
            .find(|line| line.opcode == Opcode::Jmp)
            .unwrap();
        let loop_start = listing.line_at(jmp.target.unwrap()).unwrap();
        assert_eq!((loop_start.opcode, loop_start.operand), (Opcode::IFetch, Some(8)));

        let jz = listing.branches().find(|line| line.opcode == Opcode::Jz).unwrap();
        assert_eq!(jz.target, Some(jmp.address + 2));

        let jnz = listing
            .branches()
            .find(|line| line.opcode == Opcode::Jnz)
            .unwrap();
        // The do-while body starts right after the while loop ends.
        assert_eq!(jnz.target, jz.target);
    }

    #[test]
    fn stops_at_halt() {
        let listing = disassemble(&[Opcode::Halt as u8, 99]).expect("disassemble failed");
        assert_eq!(listing.lines.len(), 1);
    }

    #[test]
    fn reports_undecodable_code() {
        assert_eq!(
            disassemble(&[Opcode::IPop as u8, 200]),
            Err(VmError::UnknownOpcode {
                opcode: 200,
                address: 1
            })
        );
        assert_eq!(
            disassemble(&[Opcode::IPush as u8]),
            Err(VmError::CodeOutOfBounds { address: 1 })
        );
    }
}
