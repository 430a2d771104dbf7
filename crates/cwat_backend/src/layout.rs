use std::collections::HashMap;

use cwat_ir::symbols::{Symbols, VarId};
use cwat_ir::Type;

pub const WASM_PAGE_SIZE: u32 = 0x1_0000;

/// First address handed out to static data, so that no array lives at address 0.
const STATIC_BASE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLayout {
    pub size: u32,
    pub align: u32,
}

pub trait TypeExt {
    fn layout(&self) -> TypeLayout;

    /// The wasm value type holding a value of this type.
    fn val_type(&self) -> &'static str;

    /// Size of the pointee or element, used to scale pointer arithmetic.
    fn stride(&self) -> u32;
}

impl TypeExt for Type {
    fn layout(&self) -> TypeLayout {
        match self {
            Self::Int | Self::Float | Self::Pointer(_) => TypeLayout { size: 4, align: 4 },
            Self::Void => TypeLayout { size: 0, align: 1 },
            Self::Array(base, len) => {
                let base = base.layout();
                TypeLayout {
                    size: base.size.saturating_mul(*len),
                    align: base.align,
                }
            }
        }
    }

    fn val_type(&self) -> &'static str {
        match self {
            Self::Float => "f32",
            _ => "i32",
        }
    }

    fn stride(&self) -> u32 {
        // `void*` steps one byte at a time.
        self.base().map_or(1, |base| base.layout().size.max(1))
    }
}

/// Static addresses of every array variable in a program.
///
/// Each array gets one fixed slot, so a recursive function shares its arrays
/// between activations.
#[derive(Debug, Default)]
pub struct StaticLayout {
    addresses: HashMap<VarId, u32>,
    end: u32,
}

impl StaticLayout {
    pub fn new(symbols: &Symbols) -> Self {
        let mut addresses = HashMap::new();
        let mut offset = STATIC_BASE;

        for (id, var) in symbols.vars.iter_keys() {
            if !matches!(var.ty, Type::Array(..)) {
                continue;
            }

            let layout = var.ty.layout();
            offset = align_up(offset, layout.align);
            addresses.insert(id, offset);
            offset = offset.saturating_add(layout.size);
        }

        log::trace!("{} static arrays, {offset} bytes", addresses.len());

        Self {
            addresses,
            end: offset,
        }
    }

    pub fn address(&self, var: VarId) -> Option<u32> {
        self.addresses.get(&var).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Pages of linear memory needed to hold every array.
    pub fn pages(&self) -> u32 {
        self.end.div_ceil(WASM_PAGE_SIZE).max(1)
    }
}

fn align_up(offset: u32, align: u32) -> u32 {
    offset.div_ceil(align).saturating_mul(align)
}
