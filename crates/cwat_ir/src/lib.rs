//! Types for representing the program between the frontend and the backend.

#[macro_use]
extern crate macro_rules_attribute;

pub mod ast;
pub mod symbols;

use std::fmt;

derive_alias! {
    #[derive(Node!)] = #[derive(Debug, Clone, PartialEq)];
    #[derive(NodeCopy!)] = #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)];
}

#[derive(NodeCopy!)]
pub enum BinOp {
    Assign,

    Add,
    Sub,
    Mul,
    Div,

    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    LogicalAnd,
    LogicalOr,

    BitwiseAnd,
    BitwiseOr,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::Gt | Self::LtEq | Self::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr)
    }
}

#[derive(NodeCopy!)]
pub enum UnOp {
    Negate,
    Not,
    AddressOf,
    Deref,

    /// Conversion to the type of the enclosing expression.
    Cast,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Void,
    Pointer(Box<Type>),
    Array(Box<Type>, u32),
}

impl Type {
    pub fn pointer_to(self) -> Self {
        Self::Pointer(Box::new(self))
    }

    /// Int, float or pointer: anything that fits in a single value and can be tested for zero.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Pointer(_))
    }

    pub fn is_pointer_like(&self) -> bool {
        matches!(self, Self::Pointer(_) | Self::Array(..))
    }

    /// The pointee of a pointer or the element of an array.
    pub fn base(&self) -> Option<&Type> {
        match self {
            Self::Pointer(base) | Self::Array(base, _) => Some(base),
            _ => None,
        }
    }

    /// Arrays decay to a pointer to their element, every other type is unchanged.
    pub fn decay(&self) -> Type {
        match self {
            Self::Array(base, _) => Self::Pointer(base.clone()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Void => write!(f, "void"),
            Self::Pointer(base) => write!(f, "{base}*"),
            Self::Array(..) => {
                let mut ty = self;
                let mut lengths = vec![];

                while let Self::Array(base, len) = ty {
                    lengths.push(*len);
                    ty = base;
                }

                write!(f, "{ty}")?;
                for len in lengths {
                    write!(f, "[{len}]")?;
                }

                Ok(())
            }
        }
    }
}
