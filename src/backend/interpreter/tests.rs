use super::*;
use crate::parser::parse;

fn variable(slot: u8) -> Expression {
    Expression::Variable(slot)
}

fn int(value: i32) -> Expression {
    Expression::Constant(value)
}

fn assign(slot: u8, value: Expression) -> Statement {
    Statement::Expr(Expression::Assign {
        slot,
        value: Box::new(value),
    })
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn run_program(interpreter: &Interpreter, program: &Program) -> anyhow::Result<Globals> {
    interpreter.prepare(program)?.run()
}

fn run_source(source: &str) -> Globals {
    let program = parse(source).expect("parse failed");
    run_program(&Interpreter::new(), &program).expect("run failed")
}

fn expect_interpreter_error(error: anyhow::Error) -> InterpreterError {
    error
        .downcast::<InterpreterError>()
        .expect("expected InterpreterError")
}

#[test]
fn evaluates_assignment_and_addition() {
    let program = Program {
        body: assign(2, binary(int(1), BinaryOperator::Add, int(2))),
    };

    let globals = run_program(&Interpreter::new(), &program).expect("run failed");
    assert_eq!(globals.value_of('c'), Some(3));
}

#[test]
fn runs_concrete_scenarios() {
    assert_eq!(run_source("a=1;").to_string(), "a = 1\n");
    assert_eq!(
        run_source("a=1; b=2; c=a+b;").to_string(),
        "a = 1\nb = 2\nc = 3\n"
    );
    assert_eq!(run_source("i=1; while (i<5) i=i+i;").to_string(), "i = 8\n");
    assert_eq!(
        run_source("a=0; if (a<1) a=10; else a=20;").to_string(),
        "a = 10\n"
    );
    assert_eq!(run_source("i=0; do i=i+1; while (i<3);").to_string(), "i = 3\n");
}

#[test]
fn executes_if_else_branches() {
    let program = |condition: i32| Program {
        body: Statement::IfThenElse {
            condition: int(condition),
            then_branch: Box::new(assign(0, int(1))),
            else_branch: Box::new(assign(1, int(2))),
        },
    };

    let taken = run_program(&Interpreter::new(), &program(-3)).expect("run failed");
    assert_eq!(taken.to_string(), "a = 1\n");
    let skipped = run_program(&Interpreter::new(), &program(0)).expect("run failed");
    assert_eq!(skipped.to_string(), "b = 2\n");
}

#[test]
fn do_while_runs_body_at_least_once() {
    let globals = run_source("do a=a+1; while (0);");
    assert_eq!(globals.value_of('a'), Some(1));
}

#[test]
fn subtraction_can_go_negative() {
    let globals = run_source("a=3-5;");
    assert_eq!(globals.value_of('a'), Some(-2));
}

#[test]
fn chained_assignment_stores_every_target() {
    let globals = run_source("a=b=c=7;");
    assert_eq!(globals.to_string(), "a = 7\nb = 7\nc = 7\n");
}

#[test]
fn accepts_constants_beyond_a_byte() {
    let globals = run_source("a=100000; b=a+a;");
    assert_eq!(globals.value_of('b'), Some(200_000));
}

#[test]
fn arithmetic_wraps_on_overflow() {
    let globals = run_source("a=2147483647; b=a+1;");
    assert_eq!(globals.value_of('b'), Some(i32::MIN));
}

#[test]
fn sequence_yields_last_statement_value() {
    let mut globals = Globals::new();
    let mut evaluator = Evaluator {
        globals: &mut globals,
        depth: 0,
        max_depth: Config::DEFAULT_MAX_DEPTH,
    };
    let program = parse("{ a=4; a+5; }").expect("parse failed");
    assert_eq!(evaluator.exec_statement(&program.body), Ok(9));
}

#[test]
fn executes_into_caller_owned_globals() {
    let program = parse("b=a+1;").expect("parse failed");
    let mut globals = Globals::new();
    globals.set(0, 41);
    Interpreter::new()
        .execute(&program, &mut globals)
        .expect("run failed");
    assert_eq!(globals.value_of('b'), Some(42));
}

#[test]
fn reports_invalid_slot() {
    let program = Program {
        body: Statement::Expr(variable(30)),
    };

    let error = run_program(&Interpreter::new(), &program).expect_err("expected failure");
    assert_eq!(
        expect_interpreter_error(error),
        InterpreterError::InvalidSlot { slot: 30 }
    );
}

#[test]
fn bounds_recursion_depth() {
    let mut body = assign(0, int(1));
    for _ in 0..20 {
        body = Statement::IfThen {
            condition: int(1),
            then_branch: Box::new(body),
        };
    }
    let program = Program { body };

    let shallow = Interpreter::with_config(Config::default().with_max_depth(8));
    let error = run_program(&shallow, &program).expect_err("expected failure");
    assert_eq!(
        expect_interpreter_error(error),
        InterpreterError::NestingTooDeep { limit: 8 }
    );

    let globals = run_program(&Interpreter::new(), &program).expect("run failed");
    assert_eq!(globals.value_of('a'), Some(1));
}
