use anyhow::Result;

use crate::ast::Program;
use crate::config::Config;
use crate::globals::Globals;

pub mod bytecode;
pub mod disasm;
pub mod interpreter;
pub mod vm;

/// Executable artifact produced by a backend `prepare` step.
///
/// Each run starts from zeroed globals, so running the same artifact twice
/// yields the same store.
pub trait PreparedBackend {
    fn run(&self) -> Result<Globals>;
}

/// Common interface implemented by each execution path.
///
/// `prepare` translates the AST into backend-owned executable state, while
/// `run` offers the convenience path for one-shot execution.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>>;

    fn run(&self, program: &Program) -> Result<Globals> {
        self.prepare(program)?.run()
    }
}

pub fn backends(config: Config) -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(interpreter::Interpreter::with_config(config)),
        Box::new(vm::VM::with_config(config)),
    ]
}

pub fn backend_named(name: &str, config: Config) -> Option<Box<dyn Backend>> {
    backends(config)
        .into_iter()
        .find(|backend| backend.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn finds_backends_by_name() {
        assert_eq!(
            backend_named("vm", Config::default()).map(|backend| backend.name()),
            Some("vm")
        );
        assert_eq!(
            backend_named("interpreter", Config::default()).map(|backend| backend.name()),
            Some("interpreter")
        );
        assert!(backend_named("jit", Config::default()).is_none());
    }

    #[test]
    fn backends_agree_on_final_globals() {
        let sources = [
            "a=1;",
            "a=1; b=2; c=a+b;",
            "i=1; while (i<5) i=i+i;",
            "a=0; if (a<1) a=10; else a=20;",
            "i=0; do i=i+1; while (i<3);",
            "{ i=0; s=0; while (i<10) { s=s+i; i=i+1; } }",
            "a=5; b=a-7; c=b<a; d=a<b; if (d) e=1; else if (c) e=2;",
            "x=(y=3)+(z=4); do { x=x-1; n=n+1; } while (0<x);",
            "{}",
        ];

        for source in sources {
            let program = parse(source).expect("parse failed");
            let results: Vec<Globals> = backends(Config::default())
                .iter()
                .map(|backend| backend.run(&program).expect("run failed"))
                .collect();
            assert_eq!(results[0], results[1], "backends disagree on {source}");
        }
    }

    #[test]
    fn prepared_programs_are_rerunnable() {
        let program = parse("i=0; while (i<9) i=i+3;").expect("parse failed");
        for backend in backends(Config::default()) {
            let prepared = backend.prepare(&program).expect("prepare failed");
            let first = prepared.run().expect("run failed");
            let second = prepared.run().expect("run failed");
            assert_eq!(first, second);
            assert_eq!(first.value_of('i'), Some(9));
        }
    }

    #[test]
    fn long_programs_run_or_fail_with_an_error() {
        let program = parse(&"a=a+1;".repeat(100_000)).expect("parse failed");

        let interpreter = backend_named("interpreter", Config::default()).expect("missing backend");
        let globals = interpreter.run(&program).expect("run failed");
        assert_eq!(globals.value_of('a'), Some(100_000));

        let vm = backend_named("vm", Config::default()).expect("missing backend");
        let error = vm.run(&program).expect_err("code cannot fit in memory");
        assert!(error.to_string().contains("1024"), "{error}");
    }
}
