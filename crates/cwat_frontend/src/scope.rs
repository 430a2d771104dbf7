use std::collections::HashMap;

use cwat_interner::Istr;
use cwat_ir::symbols::{FuncId, VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Var(VarId),
    Func(FuncId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DuplicateSymbolError {
    pub first: Binding,
    pub second: Binding,
}

/// Stack of lexical scopes. The bottom frame is the global scope and is never popped.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<HashMap<Istr, Binding>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.frames.len() > 1, "popped the global scope");

        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Binds `name` in the innermost scope, keeping the existing binding on conflict.
    pub fn add(&mut self, name: Istr, binding: Binding) -> Result<(), DuplicateSymbolError> {
        let frame = self
            .frames
            .last_mut()
            .expect("the global scope always exists");

        match frame.get(&name) {
            Some(&first) => Err(DuplicateSymbolError {
                first,
                second: binding,
            }),
            None => {
                frame.insert(name, binding);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: Istr) -> Option<Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(&name).copied())
    }
}
