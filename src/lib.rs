pub mod context;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod symbol_table;
pub mod value;

use std::rc::Rc;

use context::Context;
use error::Error;
use interpreter::Interpreter;
use lexer::Lexer;
use parser::Parser;
use value::{global_symbol_table, Value};

/// Runs one program end to end: lex, parse, evaluate. Exactly one of the
/// returned `Value`/`Error` is present.
pub fn run(file_name: &str, text: &str) -> (Option<Value>, Option<Error>) {
    let tokens = match Lexer::new(file_name, text).make_tokens() {
        Ok(tokens) => tokens,
        Err(e) => return (None, Some(e)),
    };

    let ast = match Parser::new(tokens).parse() {
        Ok(ast) => ast,
        Err(e) => return (None, Some(e)),
    };

    let global_context = Rc::new(Context::new("<main>", None, None, global_symbol_table()));

    match Interpreter::visit(&ast, &global_context) {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e)),
    }
}
