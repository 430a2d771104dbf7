use cwat_interner::Istr;
use cwat_utils::keyvec::{declare_key_type, KeyVec};

use crate::Type;

/// Every variable and function of a program, addressed by id.
#[derive(Default, Debug, Clone)]
pub struct Symbols {
    pub vars: KeyVec<VarId, VarSymbol>,
    pub funcs: KeyVec<FuncId, FuncSymbol>,
}

declare_key_type! { pub struct VarId; }

declare_key_type! { pub struct FuncId; }

#[derive(Debug, Clone, PartialEq)]
pub struct VarSymbol {
    pub name: Istr,
    pub ty: Type,
    pub storage: Storage,

    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Local,
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncSymbol {
    pub name: Istr,

    pub ret_ty: Type,
    pub params: Vec<Type>,

    pub state: FuncState,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncState {
    /// Imported from the host.
    Extern,

    /// Forward declared, no body seen yet.
    Declared,

    Defined,
}
