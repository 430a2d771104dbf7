//! Compiles a small C subset to a WebAssembly text module.

pub mod diagnostics;
pub mod session;


pub use cwat_frontend::{CompileError, CompileResult, ErrorKind};

use cwat_interner::Interner;

/// Compiles a whole program, returning the module text or the first error found.
pub fn compile(source: &str) -> CompileResult<String> {
    let mut interner = Interner::new();

    let (program, symbols) = cwat_frontend::parse(source, &mut interner)?;
    log::debug!("emitting module with {} variables", symbols.vars.len());

    Ok(cwat_backend::emit_program(&program, &symbols, &interner))
}
