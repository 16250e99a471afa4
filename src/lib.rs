// Rust 1.93+ triggers false positives on thiserror/miette derive macro fields
#![allow(unused_assignments)]

//! jsonmap
//!
//! A small mapping language that transforms JSON documents into other JSON
//! documents. A program is a sequence of named bindings whose right-hand
//! sides project, restructure, and iterate over an input value:
//!
//! ```jsonmap
//! speaker = &actor;
//! classes = map &schedule { subject = &class; };
//! store   = &!store;
//! ```
//!
//! `&path` reads from the current scope, `&?` from the anonymous scope set
//! by `map`/`zip`, and `&!` from the original top-level input.
//!
//! # Example
//!
//! ```
//! use jsonmap::{translate, Value};
//!
//! let input = Value::from_serde_json(serde_json::json!({
//!     "actor": "Alice",
//!     "line": "Hi",
//! }));
//! let output = translate("speaker = &actor; message = &line;", input).unwrap();
//! assert_eq!(
//!     output.to_serde_json(),
//!     serde_json::json!({"speaker": "Alice", "message": "Hi"})
//! );
//! ```

pub mod emitter;
pub mod errors;
pub mod evaluator;
pub mod lexer;
pub mod parser;

pub use emitter::{emit, Emitter, JsonEmitter, OutputFormat};
pub use errors::{JsonMapError, JsonMapResult};
pub use evaluator::{Env, Evaluator, Value};
pub use lexer::token::{SourceLocation, Token, TokenKind};
pub use lexer::Lexer;
pub use parser::ast;
pub use parser::Parser;

/// Translate a program against an input document.
///
/// Runs the full pipeline: lex, parse, evaluate. The call is pure and safe
/// to invoke from independent threads; no state is shared between runs.
pub fn translate(program: &str, input: Value) -> JsonMapResult<Value> {
    let ast = check(program)?;
    let mut evaluator = Evaluator::new(program);
    evaluator.evaluate(&ast, &input)
}

/// Parse a program without evaluating it (syntax check)
pub fn check(program: &str) -> JsonMapResult<ast::Program> {
    let mut lexer = Lexer::new(program, None);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens, program);
    parser.parse()
}
