use cwat_interner::Istr;

use super::{BinOp, Literal, Node, UnOp};
use crate::symbols::{FuncId, VarId};
use crate::Type;

#[derive(Node!)]
pub struct Program {
    pub items: Vec<Item>,

    /// Imported functions in declaration order.
    pub externs: Vec<FuncId>,
}

#[derive(Node!)]
pub enum Item {
    Func(Function),
    Global(GlobalDecl),
}

#[derive(Node!, Copy)]
pub struct GlobalDecl {
    pub var: VarId,

    /// Constant-folded initializer.
    pub init: Option<Literal>,
}

#[derive(Node!)]
pub struct Function {
    pub id: FuncId,
    pub name: Istr,
    pub ret_ty: Type,

    pub params: Vec<VarId>,

    /// Every variable declared in the function, parameters first.
    pub locals: Vec<VarId>,

    pub body: Vec<Stmt>,
}

#[derive(Node!)]
pub enum Stmt {
    VarDecl { var: VarId, init: Option<Expr> },
    Expr(Expr),
    Return(Option<Expr>),
    If(IfStmt),
    While { cond: Expr, body: Vec<Stmt> },
    Break,
    Continue,
}

#[derive(Node!)]
pub struct IfStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub next: Option<Box<Else>>,
}

#[derive(Node!)]
pub enum Else {
    If(IfStmt),
    Block(Vec<Stmt>),
}

#[derive(Node!)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub line: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type, line: usize) -> Self {
        Self { kind, ty, line }
    }
}

#[derive(Node!)]
pub enum ExprKind {
    Literal(Literal),
    Var(VarId),
    Call {
        func: FuncId,
        args: Vec<Expr>,
    },
    UnOp {
        op: UnOp,
        expr: Box<Expr>,
    },
    BinOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}
