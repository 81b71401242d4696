use anyhow::Result;
use log::trace;

use crate::ast::{BinaryOperator, Expression, Program, Statement};
use crate::backend::{Backend, PreparedBackend};
use crate::config::Config;
use crate::globals::Globals;

mod error;

pub use error::{InterpreterError, InterpreterResult};

/// AST-walking backend that executes programs directly without compilation.
pub struct Interpreter {
    config: Config,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Evaluates `program` against `globals`, which the program mutates in place.
    pub fn execute(&self, program: &Program, globals: &mut Globals) -> InterpreterResult<()> {
        let mut evaluator = Evaluator {
            globals,
            depth: 0,
            max_depth: self.config.max_depth,
        };
        evaluator.exec_statement(&program.body)?;
        trace!("Interpreted program");
        Ok(())
    }
}

/// Prepared executable program for the tree-walking interpreter.
pub struct PreparedInterpreter {
    program: Program,
    config: Config,
}

impl PreparedBackend for PreparedInterpreter {
    fn run(&self) -> Result<Globals> {
        let mut globals = Globals::new();
        Interpreter::with_config(self.config).execute(&self.program, &mut globals)?;
        Ok(globals)
    }
}

impl Backend for Interpreter {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(PreparedInterpreter {
            program: program.clone(),
            config: self.config,
        }))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

struct Evaluator<'g> {
    globals: &'g mut Globals,
    depth: usize,
    max_depth: usize,
}

impl Evaluator<'_> {
    /// Statements yield the value of the last expression they evaluated, or 0.
    fn exec_statement(&mut self, statement: &Statement) -> InterpreterResult<i32> {
        self.descend()?;
        let value = match statement {
            Statement::IfThen {
                condition,
                then_branch,
            } => {
                if self.eval_expression(condition)? != 0 {
                    self.exec_statement(then_branch)?;
                }
                0
            }
            Statement::IfThenElse {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expression(condition)? != 0 {
                    self.exec_statement(then_branch)?;
                } else {
                    self.exec_statement(else_branch)?;
                }
                0
            }
            Statement::While { condition, body } => {
                while self.eval_expression(condition)? != 0 {
                    self.exec_statement(body)?;
                }
                0
            }
            Statement::DoWhile { body, condition } => {
                loop {
                    self.exec_statement(body)?;
                    if self.eval_expression(condition)? == 0 {
                        break;
                    }
                }
                0
            }
            Statement::Expr(expr) => self.eval_expression(expr)?,
            Statement::Sequence { .. } => {
                let mut last = 0;
                for item in statement.sequence_items() {
                    last = self.exec_statement(item)?;
                }
                last
            }
            Statement::Empty => 0,
        };
        self.ascend();
        Ok(value)
    }

    fn eval_expression(&mut self, expr: &Expression) -> InterpreterResult<i32> {
        self.descend()?;
        let value = match expr {
            Expression::Constant(value) => *value,
            Expression::Variable(slot) => self
                .globals
                .get(*slot)
                .ok_or(InterpreterError::InvalidSlot { slot: *slot })?,
            Expression::Assign { slot, value } => {
                let value = self.eval_expression(value)?;
                if !self.globals.set(*slot, value) {
                    return Err(InterpreterError::InvalidSlot { slot: *slot });
                }
                value
            }
            Expression::Binary { left, op, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                match op {
                    BinaryOperator::Add => left.wrapping_add(right),
                    BinaryOperator::Subtract => left.wrapping_sub(right),
                    BinaryOperator::LessThan => i32::from(left < right),
                }
            }
        };
        self.ascend();
        Ok(value)
    }

    fn descend(&mut self) -> InterpreterResult<()> {
        if self.depth >= self.max_depth {
            return Err(InterpreterError::NestingTooDeep {
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

#[cfg(test)]
mod tests;
