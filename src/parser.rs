use log::trace;

use crate::ast::{BinaryOperator, Expression, Program, Statement};
use crate::config::Config;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

mod error;

pub use error::{ParseError, ParseResult};

/// Recursive-descent parser over a single token of lookahead.
///
/// ```text
/// program     := {statement}
/// statement   := "if" paren_expr statement ["else" statement]
///              | "while" paren_expr statement
///              | "do" statement "while" paren_expr ";"
///              | "{" {statement} "}"
///              | expr ";"
///              | ";"
/// paren_expr  := "(" expr ")"
/// expr        := test | IDENT "=" expr
/// test        := sum | sum "<" sum
/// sum         := term {("+" | "-") term}
/// term        := IDENT | CONSTANT | paren_expr
/// ```
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> ParseResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
            max_depth: Config::DEFAULT_MAX_DEPTH,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parses statements up to end of input.
    ///
    /// A single statement is the program body as-is; several are chained the
    /// same way as the contents of a block.
    pub fn parse_program(mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::End) {
            if matches!(self.current.kind, TokenKind::RBrace) {
                return Err(self.error("end of input"));
            }
            statements.push(self.parse_statement()?);
        }
        let body = if statements.len() == 1 {
            statements.pop().unwrap_or(Statement::Empty)
        } else {
            chain(statements)
        };
        trace!(
            "Parsed program with {} top-level statements",
            body.sequence_items().len()
        );
        Ok(Program { body })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        self.descend()?;
        let statement = match self.current.kind {
            TokenKind::If => {
                self.advance()?;
                let condition = self.parse_paren_expr()?;
                let then_branch = Box::new(self.parse_statement()?);
                if matches!(self.current.kind, TokenKind::Else) {
                    self.advance()?;
                    Statement::IfThenElse {
                        condition,
                        then_branch,
                        else_branch: Box::new(self.parse_statement()?),
                    }
                } else {
                    Statement::IfThen {
                        condition,
                        then_branch,
                    }
                }
            }
            TokenKind::While => {
                self.advance()?;
                let condition = self.parse_paren_expr()?;
                let body = Box::new(self.parse_statement()?);
                Statement::While { condition, body }
            }
            TokenKind::Do => {
                self.advance()?;
                let body = Box::new(self.parse_statement()?);
                self.expect(TokenKind::While, "'while'")?;
                let condition = self.parse_paren_expr()?;
                self.expect(TokenKind::Semicolon, "';'")?;
                Statement::DoWhile { body, condition }
            }
            TokenKind::LBrace => {
                self.advance()?;
                let mut statements = Vec::new();
                while !matches!(self.current.kind, TokenKind::RBrace) {
                    statements.push(self.parse_statement()?);
                }
                self.advance()?;
                chain(statements)
            }
            TokenKind::Semicolon => {
                self.advance()?;
                Statement::Empty
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "';'")?;
                Statement::Expr(expr)
            }
        };
        self.ascend();
        Ok(statement)
    }

    fn parse_paren_expr(&mut self) -> ParseResult<Expression> {
        self.expect(TokenKind::LParen, "'('")?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(expr)
    }

    fn parse_expr(&mut self) -> ParseResult<Expression> {
        self.descend()?;
        let target = self.current;
        let expr = self.parse_test()?;
        let expr = if matches!(self.current.kind, TokenKind::Equal) {
            let Expression::Variable(slot) = expr else {
                return Err(ParseError::InvalidAssignmentTarget {
                    line: target.span.line,
                    column: target.span.column,
                });
            };
            self.advance()?;
            Expression::Assign {
                slot,
                value: Box::new(self.parse_expr()?),
            }
        } else {
            expr
        };
        self.ascend();
        Ok(expr)
    }

    fn parse_test(&mut self) -> ParseResult<Expression> {
        let left = self.parse_sum()?;
        if !matches!(self.current.kind, TokenKind::Less) {
            return Ok(left);
        }
        self.advance()?;
        let right = self.parse_sum()?;
        Ok(Expression::Binary {
            left: Box::new(left),
            op: BinaryOperator::LessThan,
            right: Box::new(right),
        })
    }

    /// Each folded operator nests the chain one level deeper, so it counts
    /// against the depth limit like any other nesting.
    fn parse_sum(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_term()?;
        let mut folded = 0;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.descend()?;
            folded += 1;
            self.advance()?;
            let right = self.parse_term()?;
            expr = Expression::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        for _ in 0..folded {
            self.ascend();
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> ParseResult<Expression> {
        match self.current.kind {
            TokenKind::Ident(slot) => {
                self.advance()?;
                Ok(Expression::Variable(slot))
            }
            TokenKind::Constant(value) => {
                self.advance()?;
                Ok(Expression::Constant(value))
            }
            TokenKind::LParen => self.parse_paren_expr(),
            _ => Err(self.error("identifier, constant or '('")),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> ParseResult<()> {
        if self.current.kind == kind {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn advance(&mut self) -> ParseResult<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn descend(&mut self) -> ParseResult<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
                line: self.current.span.line,
                column: self.current.span.column,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn error(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            found: self.current.kind,
            line: self.current.span.line,
            column: self.current.span.column,
        }
    }
}

/// Folds statements into a left-leaning `Sequence` chain; no statements is `Empty`.
fn chain(statements: Vec<Statement>) -> Statement {
    statements
        .into_iter()
        .fold(None, |first, next| {
            Some(Box::new(Statement::Sequence {
                first,
                next: Box::new(next),
            }))
        })
        .map_or(Statement::Empty, |sequence| *sequence)
}

pub fn parse(input: &str) -> ParseResult<Program> {
    Parser::new(input)?.parse_program()
}

pub fn parse_with_config(input: &str, config: &Config) -> ParseResult<Program> {
    Parser::new(input)?
        .with_max_depth(config.max_depth)
        .parse_program()
}
