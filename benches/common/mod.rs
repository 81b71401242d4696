#![allow(dead_code)]
use std::fs;

use tinyc::ast::Program;
use tinyc::config::Config;
use tinyc::parser;

pub const WORKLOADS: [(&str, &str); 2] = [
    ("nested_loops", "benches/programs/nested_loops.tc"),
    ("fibonacci", "benches/programs/fibonacci.tc"),
];

/// Leaves room for the condition cells the loops leave behind.
pub fn bench_config() -> Config {
    Config::default().with_memory_size(4096)
}

pub fn workloads() -> impl Iterator<Item = (&'static str, &'static str)> {
    WORKLOADS.into_iter()
}

pub fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

pub fn load_program(path: &str) -> Program {
    let source = load_source(path);
    parser::parse(&source).unwrap_or_else(|err| panic!("parse {path}: {err}"))
}
