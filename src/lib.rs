// File: src/lib.rs
//
// Library interface for the Khwarizmi compiler/interpreter.
// Exposes each pipeline stage as a module plus the two entry points the CLI
// and tests use: `compile` (lex + parse + type check) and `run`.

pub mod ast;
pub mod config;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod logger;
pub mod parser;
pub mod repl;
pub mod solver;
pub mod type_checker;

use crate::ast::Program;
use crate::errors::{Diagnostic, RuntimeError};
use crate::interpreter::{InputSource, Interpreter, OutputSink};
use crate::parser::Parser;
use crate::type_checker::TypeChecker;
use tracing::debug;

/// Lexes, parses, and type checks `source`.
///
/// On failure every diagnostic found is returned, in source order, with the
/// offending source line attached.
pub fn compile(source: &str) -> Result<Program, Vec<Diagnostic>> {
    let tokens = lexer::tokenize(source);
    debug!(tokens = tokens.len(), "lexed source");

    let attach = |diagnostics: Vec<Diagnostic>| -> Vec<Diagnostic> {
        diagnostics.into_iter().map(|d| d.attach_source(source)).collect()
    };

    let mut program = Parser::new(tokens).parse().map_err(attach)?;
    TypeChecker::new().check(&mut program).map_err(attach)?;
    Ok(program)
}

/// Executes a compiled program with a fresh environment
pub fn run(program: &Program, input: &mut dyn InputSource, output: &mut dyn OutputSink) -> Result<(), RuntimeError> {
    Interpreter::new().execute(program, input, output)
}
