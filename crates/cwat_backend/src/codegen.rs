use std::fmt::Write as _;

use cwat_interner::Interner;
use cwat_ir::ast::*;
use cwat_ir::symbols::{FuncId, Storage, Symbols, VarId};
use cwat_ir::{BinOp, Literal, Type, UnOp};

use crate::layout::{StaticLayout, TypeExt};

const INDENT: &str = "    ";

pub struct Codegen<'a> {
    symbols: &'a Symbols,
    interner: &'a Interner,
    layout: StaticLayout,

    out: String,
    indent: usize,
    loop_depth: usize,

    /// Set once any load is emitted.
    uses_memory: bool,
}

impl<'a> Codegen<'a> {
    pub fn new(symbols: &'a Symbols, interner: &'a Interner) -> Self {
        Self {
            symbols,
            interner,
            layout: StaticLayout::new(symbols),

            out: String::new(),
            indent: 0,
            loop_depth: 0,

            uses_memory: false,
        }
    }

    pub fn program(mut self, program: &Program) -> String {
        // Definitions go first so the header knows whether memory is needed.
        self.indent = 1;

        for item in &program.items {
            if let Item::Global(global) = item {
                self.global(global);
            }
        }

        for item in &program.items {
            if let Item::Func(func) = item {
                self.function(func);
            }
        }

        let definitions = std::mem::take(&mut self.out);

        self.indent = 0;
        self.line("(module");
        self.indent = 1;

        for &func in &program.externs {
            self.import(func);
        }

        // Memory stays private: every exported name belongs to a user function.
        if self.uses_memory || !self.layout.is_empty() {
            let pages = self.layout.pages();
            self.line(format!("(memory {pages})"));
        }

        self.out.push_str(&definitions);

        self.indent = 0;
        self.line(")");

        log::debug!(
            "emitted {} items, {} imports",
            program.items.len(),
            program.externs.len()
        );

        self.out
    }

    fn import(&mut self, func: FuncId) {
        let (symbols, interner) = (self.symbols, self.interner);
        let symbol = &symbols.funcs[func];
        let name = &interner[symbol.name];

        let mut signature = format!("(func ${name}");
        for param in &symbol.params {
            let _ = write!(signature, " (param {})", param.val_type());
        }
        if symbol.ret_ty != Type::Void {
            let _ = write!(signature, " (result {})", symbol.ret_ty.val_type());
        }
        signature.push(')');

        self.line(format!("(import \"env\" \"{name}\" {signature})"));
    }

    fn global(&mut self, global: &GlobalDecl) {
        let name = var_name(global.var);

        if let Some(address) = self.layout.address(global.var) {
            self.line(format!("(global {name} i32 (i32.const {address}))"));
            return;
        }

        let ty = self.symbols.vars[global.var].ty.val_type();
        let value = match global.init {
            Some(Literal::Int(n)) => n.to_string(),
            Some(Literal::Float(f)) => format!("{f:?}"),
            None => "0".to_owned(),
        };

        self.line(format!("(global {name} (mut {ty}) ({ty}.const {value}))"));
    }

    fn function(&mut self, func: &Function) {
        let (symbols, interner) = (self.symbols, self.interner);
        let name = &interner[func.name];

        self.line(format!("(func ${name} (export \"{name}\")"));
        self.indent += 1;

        for &param in &func.params {
            let ty = symbols.vars[param].ty.val_type();
            self.line(format!("(param {} {ty})", var_name(param)));
        }

        if func.ret_ty != Type::Void {
            self.line(format!("(result {})", func.ret_ty.val_type()));
        }

        for &local in func.locals.iter().skip(func.params.len()) {
            let ty = symbols.vars[local].ty.val_type();
            self.line(format!("(local {} {ty})", var_name(local)));
        }

        self.block(&func.body);

        if func.ret_ty != Type::Void && !matches!(func.body.last(), Some(Stmt::Return(_))) {
            self.line("unreachable");
        }

        self.indent -= 1;
        self.line(")");
    }

    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { var, init } => {
                if let Some(address) = self.layout.address(*var) {
                    self.line(format!("i32.const {address}"));
                    self.set_var(*var);
                } else if let Some(init) = init {
                    self.expr(init);
                    self.set_var(*var);
                }
            }

            Stmt::Expr(expr) => {
                self.expr(expr);
                if expr.ty != Type::Void {
                    self.line("drop");
                }
            }

            Stmt::Return(expr) => {
                if let Some(expr) = expr {
                    self.expr(expr);
                }
                self.line("return");
            }

            Stmt::If(if_stmt) => self.if_stmt(if_stmt),
            Stmt::While { cond, body } => self.while_stmt(cond, body),

            Stmt::Break => self.line(format!("br $WO{}", self.loop_depth)),
            Stmt::Continue => self.line(format!("br $WI{}", self.loop_depth)),
        }
    }

    fn if_stmt(&mut self, if_stmt: &IfStmt) {
        self.condition(&if_stmt.cond);

        self.line("(if");
        self.indent += 1;

        self.line("(then");
        self.indent += 1;
        self.block(&if_stmt.body);
        self.indent -= 1;
        self.line(")");

        if let Some(next) = &if_stmt.next {
            self.line("(else");
            self.indent += 1;
            match next.as_ref() {
                Else::If(nested) => self.if_stmt(nested),
                Else::Block(body) => self.block(body),
            }
            self.indent -= 1;
            self.line(")");
        }

        self.indent -= 1;
        self.line(")");
    }

    fn while_stmt(&mut self, cond: &Expr, body: &[Stmt]) {
        self.loop_depth += 1;
        let depth = self.loop_depth;

        self.line(format!("(block $WO{depth}"));
        self.indent += 1;
        self.line(format!("(loop $WI{depth}"));
        self.indent += 1;

        self.condition(cond);
        self.line("i32.eqz");
        self.line(format!("br_if $WO{depth}"));

        self.block(body);
        self.line(format!("br $WI{depth}"));

        self.indent -= 1;
        self.line(")");
        self.indent -= 1;
        self.line(")");

        self.loop_depth -= 1;
    }

    /// Leaves an `i32` on the stack that is nonzero when `expr` is.
    fn condition(&mut self, expr: &Expr) {
        self.expr(expr);
        if expr.ty == Type::Float {
            self.line("f32.const 0");
            self.line("f32.ne");
        }
    }

    /// Leaves exactly 0 or 1 on the stack.
    fn truth(&mut self, expr: &Expr) {
        self.condition(expr);
        if expr.ty != Type::Float && !is_boolean(expr) {
            self.line("i32.const 0");
            self.line("i32.ne");
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(n)) => self.line(format!("i32.const {n}")),
            ExprKind::Literal(Literal::Float(f)) => self.line(format!("f32.const {f:?}")),

            ExprKind::Var(var) => self.get_var(*var),

            ExprKind::Call { func, args } => {
                for arg in args {
                    self.expr(arg);
                }

                let interner = self.interner;
                let name = &interner[self.symbols.funcs[*func].name];
                self.line(format!("call ${name}"));
            }

            ExprKind::UnOp { op, expr: operand } => self.unop(*op, operand, &expr.ty),
            ExprKind::BinOp { op, lhs, rhs } => self.binop(*op, lhs, rhs),
        }
    }

    fn unop(&mut self, op: UnOp, operand: &Expr, ty: &Type) {
        match op {
            UnOp::Negate if *ty == Type::Float => {
                self.expr(operand);
                self.line("f32.neg");
            }
            UnOp::Negate => {
                self.line("i32.const 0");
                self.expr(operand);
                self.line("i32.sub");
            }

            UnOp::Not => {
                self.expr(operand);
                if operand.ty == Type::Float {
                    self.line("f32.const 0");
                    self.line("f32.eq");
                } else {
                    self.line("i32.eqz");
                }
            }

            UnOp::Deref => {
                self.expr(operand);

                // An array is its own address and is never loaded, even once decayed.
                let pointee = operand.ty.base().unwrap_or(ty);
                if !matches!(pointee, Type::Array(..)) {
                    self.uses_memory = true;
                    self.line(format!("{}.load", pointee.val_type()));
                }
            }

            UnOp::AddressOf => match &operand.kind {
                ExprKind::UnOp {
                    op: UnOp::Deref,
                    expr: inner,
                } => self.expr(inner),
                _ => self.expr(operand),
            },

            UnOp::Cast => {
                self.expr(operand);
                match (&operand.ty, ty) {
                    (Type::Int, Type::Float) => self.line("f32.convert_i32_s"),
                    (Type::Float, Type::Int) => self.line("i32.trunc_f32_s"),
                    _ => {}
                }
            }
        }
    }

    fn binop(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) {
        let float = lhs.ty == Type::Float;
        let unsigned = lhs.ty.is_pointer_like();

        let instr = match op {
            BinOp::Assign => return self.assign(lhs, rhs),
            BinOp::LogicalAnd => return self.logical(lhs, rhs, true),
            BinOp::LogicalOr => return self.logical(lhs, rhs, false),

            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div if float => "div",
            BinOp::Div => "div_s",

            BinOp::Eq => "eq",
            BinOp::NotEq => "ne",
            BinOp::Lt => ordered(float, unsigned, ["lt", "lt_u", "lt_s"]),
            BinOp::Gt => ordered(float, unsigned, ["gt", "gt_u", "gt_s"]),
            BinOp::LtEq => ordered(float, unsigned, ["le", "le_u", "le_s"]),
            BinOp::GtEq => ordered(float, unsigned, ["ge", "ge_u", "ge_s"]),

            BinOp::BitwiseAnd => "and",
            BinOp::BitwiseOr => "or",
        };

        let offset = matches!(op, BinOp::Add | BinOp::Sub);
        let lhs_ptr = lhs.ty.is_pointer_like();
        let rhs_ptr = rhs.ty.is_pointer_like();

        self.expr(lhs);
        if offset && rhs_ptr && !lhs_ptr {
            self.scale(rhs.ty.stride());
        }

        self.expr(rhs);
        if offset && lhs_ptr && !rhs_ptr {
            self.scale(lhs.ty.stride());
        }

        let prefix = if float { "f32" } else { "i32" };
        self.line(format!("{prefix}.{instr}"));

        if op == BinOp::Sub && lhs_ptr && rhs_ptr {
            let stride = lhs.ty.stride();
            if stride != 1 {
                self.line(format!("i32.const {stride}"));
                self.line("i32.div_s");
            }
        }
    }

    fn scale(&mut self, stride: u32) {
        if stride != 1 {
            self.line(format!("i32.const {stride}"));
            self.line("i32.mul");
        }
    }

    fn assign(&mut self, lhs: &Expr, rhs: &Expr) {
        self.expr(rhs);
        if let ExprKind::Var(var) = lhs.kind {
            self.set_var(var);
        }
    }

    fn logical(&mut self, lhs: &Expr, rhs: &Expr, is_and: bool) {
        self.truth(lhs);

        self.line("(if (result i32)");
        self.indent += 1;

        self.line("(then");
        self.indent += 1;
        if is_and {
            self.truth(rhs);
        } else {
            self.line("i32.const 1");
        }
        self.indent -= 1;
        self.line(")");

        self.line("(else");
        self.indent += 1;
        if is_and {
            self.line("i32.const 0");
        } else {
            self.truth(rhs);
        }
        self.indent -= 1;
        self.line(")");

        self.indent -= 1;
        self.line(")");
    }

    fn get_var(&mut self, var: VarId) {
        let instr = match self.symbols.vars[var].storage {
            Storage::Local => "local.get",
            Storage::Global => "global.get",
        };
        self.line(format!("{instr} {}", var_name(var)));
    }

    fn set_var(&mut self, var: VarId) {
        let instr = match self.symbols.vars[var].storage {
            Storage::Local => "local.set",
            Storage::Global => "global.set",
        };
        self.line(format!("{instr} {}", var_name(var)));
    }

    fn line(&mut self, line: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }
}

fn var_name(var: VarId) -> String {
    format!("$V{}", var.0)
}

/// Comparison and logical results are already 0 or 1.
fn is_boolean(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::BinOp { op, .. } => op.is_comparison() || op.is_logical(),
        ExprKind::UnOp { op, .. } => *op == UnOp::Not,
        _ => false,
    }
}

/// Picks the float, unsigned or signed form of an ordered comparison.
fn ordered(float: bool, unsigned: bool, [f, u, s]: [&'static str; 3]) -> &'static str {
    if float {
        f
    } else if unsigned {
        u
    } else {
        s
    }
}
