//! Lexing, scope resolution and type checking of C source, producing a typed [`Program`].

#[macro_use]
extern crate macro_rules_attribute;

mod error;
mod lexer;
mod parser;
mod scope;
mod types;

pub mod token;

pub use error::{CompileError, CompileResult, ErrorKind};
pub use lexer::{Cursor, Lexer, LexerErrorKind};
pub use types::TypeError;

use cwat_interner::Interner;
use cwat_ir::ast::Program;
use cwat_ir::symbols::Symbols;
use parser::Parser;

derive_alias! {
    #[derive(NodeCopy!)] = #[derive(Debug, Clone, Copy, PartialEq)];
}

/// Parses and type checks a whole program, stopping at the first error.
pub fn parse(source: &str, interner: &mut Interner) -> CompileResult<(Program, Symbols)> {
    let lexer = Lexer::new(source, interner);
    Parser::new(lexer).parse_program()
}
