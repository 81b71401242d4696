//! Compiler, stack VM and tree interpreter for a tiny C-like language.
//!
//! Source text flows through `lexer` and `parser` into the `ast`; from there
//! either `backend::bytecode` + `backend::vm` or `backend::interpreter`
//! executes it against the 26-slot `globals` store.

pub mod ast;
pub mod backend;
pub mod config;
pub mod globals;
pub mod lexer;
pub mod parser;
pub mod token;
