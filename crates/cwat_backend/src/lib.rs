//! Lowering of a typed [`Program`] to WebAssembly text.

mod codegen;
pub mod layout;

#[cfg(test)]
mod tests;

use cwat_interner::Interner;
use cwat_ir::ast::Program;
use cwat_ir::symbols::Symbols;

use crate::codegen::Codegen;

/// Emits a complete `(module ...)` for a program that has already been checked.
pub fn emit_program(program: &Program, symbols: &Symbols, interner: &Interner) -> String {
    Codegen::new(symbols, interner).program(program)
}
