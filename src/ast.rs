//! Shared syntax tree used by both execution backends.
//!
//! The parser builds these nodes once, then the interpreter walks them directly
//! while the VM backend lowers them into bytecode.

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Expression {
    Constant(i32),
    /// Load of a global slot.
    Variable(u8),
    /// Right-associative store; evaluates to the stored value.
    Assign {
        slot: u8,
        value: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Subtract,
    LessThan,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    IfThen {
        condition: Expression,
        then_branch: Box<Statement>,
    },
    IfThenElse {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Box<Statement>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
    },
    /// Expression evaluated for its effect; the value is discarded.
    Expr(Expression),
    /// One link of a block. `first` is `None` for the block's first statement.
    Sequence {
        first: Option<Box<Statement>>,
        next: Box<Statement>,
    },
    Empty,
}

impl Statement {
    /// Flattens the left-leaning chain of a block into source order.
    ///
    /// Non-sequence statements yield themselves. Walking is iterative so long
    /// blocks cost no recursion depth.
    pub fn sequence_items(&self) -> Vec<&Statement> {
        let mut items = Vec::new();
        let mut cursor = Some(self);
        while let Some(statement) = cursor {
            match statement {
                Statement::Sequence { first, next } => {
                    items.push(next.as_ref());
                    cursor = first.as_deref();
                }
                other => {
                    items.push(other);
                    cursor = None;
                }
            }
        }
        items.reverse();
        items
    }
}

impl Clone for Statement {
    fn clone(&self) -> Self {
        match self {
            Statement::IfThen {
                condition,
                then_branch,
            } => Statement::IfThen {
                condition: condition.clone(),
                then_branch: then_branch.clone(),
            },
            Statement::IfThenElse {
                condition,
                then_branch,
                else_branch,
            } => Statement::IfThenElse {
                condition: condition.clone(),
                then_branch: then_branch.clone(),
                else_branch: else_branch.clone(),
            },
            Statement::While { condition, body } => Statement::While {
                condition: condition.clone(),
                body: body.clone(),
            },
            Statement::DoWhile { body, condition } => Statement::DoWhile {
                body: body.clone(),
                condition: condition.clone(),
            },
            Statement::Expr(expr) => Statement::Expr(expr.clone()),
            Statement::Sequence { .. } => {
                // Collect the links back to front, then relink copies front to back.
                let mut links = Vec::new();
                let mut cursor = self;
                let mut base = None;
                while let Statement::Sequence { first, next } = cursor {
                    links.push(next.as_ref());
                    match first.as_deref() {
                        Some(previous @ Statement::Sequence { .. }) => cursor = previous,
                        Some(previous) => {
                            base = Some(Box::new(previous.clone()));
                            break;
                        }
                        None => break,
                    }
                }
                let mut first = base;
                for next in links.into_iter().rev() {
                    first = Some(Box::new(Statement::Sequence {
                        first,
                        next: Box::new(next.clone()),
                    }));
                }
                first.map_or(Statement::Empty, |sequence| *sequence)
            }
            Statement::Empty => Statement::Empty,
        }
    }
}

impl Drop for Statement {
    /// Unlinks a block chain one link at a time so dropping it does not
    /// recurse once per statement.
    fn drop(&mut self) {
        let Statement::Sequence { first, .. } = self else {
            return;
        };
        let mut cursor = first.take();
        while let Some(mut link) = cursor {
            cursor = match link.as_mut() {
                Statement::Sequence { first, .. } => first.take(),
                _ => None,
            };
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Program {
    pub body: Statement,
}
