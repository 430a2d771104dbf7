//! Typing rules for operators, implicit conversions and casts.

use cwat_ir::ast::{Expr, ExprKind};
use cwat_ir::{BinOp, Type, UnOp};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("types mismatching")]
    Mismatch,

    #[error("invalid operation")]
    InvalidOperation,

    #[error("void value used in an expression")]
    VoidOperand,

    #[error("only variables can be assigned to")]
    InvalidAssignTarget,

    #[error("cannot cast `{from}` to `{to}`")]
    InvalidCast { from: Type, to: Type },

    #[error("cannot take the address of this expression")]
    InvalidAddressOf,

    #[error("cannot dereference `{0}`")]
    InvalidDeref(Type),
}

pub type TypeResult<T> = Result<T, TypeError>;

/// Converts `expr` to `ty`, inserting a cast when an int is used where a float is expected.
pub fn coerce(expr: Expr, ty: &Type) -> TypeResult<Expr> {
    if expr.ty == *ty {
        return Ok(expr);
    }

    match (&expr.ty, ty) {
        (Type::Int, Type::Float) => Ok(cast(expr, Type::Float)),

        // arrays are passed around as the address of their first element
        (Type::Array(..), Type::Pointer(_)) if expr.ty.decay() == *ty => Ok(Expr {
            ty: ty.clone(),
            ..expr
        }),

        _ => Err(TypeError::Mismatch),
    }
}

fn cast(expr: Expr, ty: Type) -> Expr {
    let line = expr.line;

    Expr::new(
        ExprKind::UnOp {
            op: UnOp::Cast,
            expr: Box::new(expr),
        },
        ty,
        line,
    )
}

pub fn binary(op: BinOp, lhs: Expr, rhs: Expr, line: usize) -> TypeResult<Expr> {
    if op == BinOp::Assign {
        return assign(lhs, rhs, line);
    }

    if lhs.ty == Type::Void || rhs.ty == Type::Void {
        return Err(TypeError::VoidOperand);
    }

    let (lhs, rhs, ty) = match op {
        BinOp::LogicalAnd | BinOp::LogicalOr => {
            if !lhs.ty.is_scalar() || !rhs.ty.is_scalar() {
                return Err(TypeError::InvalidOperation);
            }
            (lhs, rhs, Type::Int)
        }

        BinOp::BitwiseAnd | BinOp::BitwiseOr => {
            if lhs.ty != Type::Int || rhs.ty != Type::Int {
                return Err(TypeError::InvalidOperation);
            }
            (lhs, rhs, Type::Int)
        }

        _ if lhs.ty.is_pointer_like() || rhs.ty.is_pointer_like() => {
            let ty = pointer_arith(op, &lhs.ty, &rhs.ty)?;
            (lhs, rhs, ty)
        }

        _ => {
            let (lhs, rhs) = promote(lhs, rhs)?;
            let ty = if op.is_comparison() {
                Type::Int
            } else {
                lhs.ty.clone()
            };
            (lhs, rhs, ty)
        }
    };

    Ok(Expr::new(
        ExprKind::BinOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        ty,
        line,
    ))
}

fn assign(lhs: Expr, rhs: Expr, line: usize) -> TypeResult<Expr> {
    if !matches!(lhs.kind, ExprKind::Var(_)) || matches!(lhs.ty, Type::Array(..)) {
        return Err(TypeError::InvalidAssignTarget);
    }

    if rhs.ty == Type::Void {
        return Err(TypeError::VoidOperand);
    }

    let rhs = coerce(rhs, &lhs.ty)?;

    Ok(Expr::new(
        ExprKind::BinOp {
            op: BinOp::Assign,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        Type::Void,
        line,
    ))
}

/// Promotes the int side of a mixed int/float pair.
fn promote(lhs: Expr, rhs: Expr) -> TypeResult<(Expr, Expr)> {
    match (&lhs.ty, &rhs.ty) {
        (Type::Int, Type::Float) => Ok((cast(lhs, Type::Float), rhs)),
        (Type::Float, Type::Int) => Ok((lhs, cast(rhs, Type::Float))),
        (a, b) if a == b => Ok((lhs, rhs)),
        _ => Err(TypeError::Mismatch),
    }
}

/// Result type of an operator with at least one pointer or array operand.
fn pointer_arith(op: BinOp, lhs: &Type, rhs: &Type) -> TypeResult<Type> {
    match (op, lhs, rhs) {
        (BinOp::Add | BinOp::Sub, ptr, Type::Int) if ptr.is_pointer_like() => Ok(ptr.decay()),
        (BinOp::Add, Type::Int, ptr) if ptr.is_pointer_like() => Ok(ptr.decay()),

        (_, a, b) if a.is_pointer_like() && b.is_pointer_like() => {
            if a.decay() != b.decay() {
                return Err(TypeError::Mismatch);
            }

            if op.is_comparison() || op == BinOp::Sub {
                Ok(Type::Int)
            } else {
                Err(TypeError::InvalidOperation)
            }
        }

        _ => Err(TypeError::InvalidOperation),
    }
}

/// Types a unary operator. `cast_ty` is the target type of a cast.
pub fn unary(op: UnOp, cast_ty: Option<Type>, expr: Expr, line: usize) -> TypeResult<Expr> {
    let ty = match op {
        UnOp::Negate => match expr.ty {
            Type::Int | Type::Float => expr.ty.clone(),
            Type::Void => return Err(TypeError::VoidOperand),
            _ => return Err(TypeError::InvalidOperation),
        },

        UnOp::Not => match expr.ty {
            Type::Void => return Err(TypeError::VoidOperand),
            ref ty if ty.is_scalar() => Type::Int,
            _ => return Err(TypeError::InvalidOperation),
        },

        UnOp::Deref => match expr.ty.base() {
            Some(base) if *base != Type::Void => base.clone(),
            _ => return Err(TypeError::InvalidDeref(expr.ty.clone())),
        },

        UnOp::AddressOf => match &expr.kind {
            ExprKind::Var(_) if matches!(expr.ty, Type::Array(..)) => expr.ty.clone().pointer_to(),
            ExprKind::UnOp {
                op: UnOp::Deref,
                expr: inner,
            } => inner.ty.clone(),
            _ => return Err(TypeError::InvalidAddressOf),
        },

        UnOp::Cast => {
            let to = cast_ty.unwrap_or_else(|| expr.ty.clone());
            check_cast(&expr.ty, &to)?;
            to
        }
    };

    Ok(Expr::new(
        ExprKind::UnOp {
            op,
            expr: Box::new(expr),
        },
        ty,
        line,
    ))
}

fn check_cast(from: &Type, to: &Type) -> TypeResult<()> {
    let valid = matches!(
        (from, to),
        (Type::Int | Type::Float, Type::Int | Type::Float)
            | (Type::Int | Type::Pointer(_), Type::Int | Type::Pointer(_))
    );

    if valid {
        Ok(())
    } else {
        Err(TypeError::InvalidCast {
            from: from.clone(),
            to: to.clone(),
        })
    }
}
