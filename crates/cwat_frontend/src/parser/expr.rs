//! Expressions are built in two steps. The tokens of a run are first turned into a flat
//! list of operands and operator placeholders with holes. The list is then collapsed by
//! repeatedly moving a complete node into the hole of whichever neighboring operator
//! binds it more tightly.

use cwat_interner::Istr;
use cwat_ir::ast::{Expr, ExprKind};
use cwat_ir::symbols::FuncId;
use cwat_ir::{BinOp, Literal, Type, UnOp};
use cwat_utils::keyvec::{declare_key_type, KeyVec};

use super::Parser;
use crate::error::{CompileResult, ErrorKind};
use crate::scope::Binding;
use crate::token::{Token, TokenKind};
use crate::types;

declare_key_type! { struct NodeId; }

/// Right binding power of prefix operators and casts.
const UNARY_POWER: u8 = 30;

/// Left and right binding power of a binary operator.
fn binding_power(op: BinOp) -> (u8, u8) {
    match op {
        BinOp::Assign => (1, 2),

        BinOp::LogicalAnd | BinOp::LogicalOr => (3, 4),
        BinOp::BitwiseAnd | BinOp::BitwiseOr => (5, 6),

        BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => (7, 8),

        BinOp::Add | BinOp::Sub => (10, 11),
        BinOp::Mul | BinOp::Div => (20, 21),
    }
}

fn binary_op(kind: TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::Eq => BinOp::Assign,

        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,

        TokenKind::EqEq => BinOp::Eq,
        TokenKind::BangEq => BinOp::NotEq,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::LtEq => BinOp::LtEq,
        TokenKind::GtEq => BinOp::GtEq,

        TokenKind::AmpAmp => BinOp::LogicalAnd,
        TokenKind::PipePipe => BinOp::LogicalOr,
        TokenKind::Amp => BinOp::BitwiseAnd,
        TokenKind::Pipe => BinOp::BitwiseOr,

        _ => return None,
    };

    Some(op)
}

/// Prefix reading of a token that is ambiguous between a unary and a binary operator.
fn prefix_op(kind: TokenKind) -> Option<UnOp> {
    match kind {
        TokenKind::Minus => Some(UnOp::Negate),
        TokenKind::Star => Some(UnOp::Deref),
        TokenKind::Amp => Some(UnOp::AddressOf),
        _ => None,
    }
}

#[derive(Debug)]
enum Node {
    Operand(Expr),

    Unary {
        op: UnOp,
        cast_ty: Option<Type>,
        operand: Option<NodeId>,
        line: usize,
    },

    Binary {
        op: BinOp,
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
        line: usize,
    },
}

impl Node {
    fn line(&self) -> usize {
        match self {
            Self::Operand(expr) => expr.line,
            Self::Unary { line, .. } | Self::Binary { line, .. } => *line,
        }
    }

    /// Whether every hole of the node has been filled.
    fn is_complete(&self) -> bool {
        match self {
            Self::Operand(_) => true,
            Self::Unary { operand, .. } => operand.is_some(),
            Self::Binary { lhs, rhs, .. } => lhs.is_some() && rhs.is_some(),
        }
    }

    fn open_left_power(&self) -> Option<u8> {
        match self {
            Self::Binary { op, lhs: None, .. } => Some(binding_power(*op).0),
            _ => None,
        }
    }

    fn open_right_power(&self) -> Option<u8> {
        match self {
            Self::Binary { op, rhs: None, .. } => Some(binding_power(*op).1),
            Self::Unary { operand: None, .. } => Some(UNARY_POWER),
            _ => None,
        }
    }

    fn fill_left(&mut self, child: NodeId) {
        if let Self::Binary { lhs, .. } = self {
            *lhs = Some(child);
        }
    }

    fn fill_right(&mut self, child: NodeId) {
        match self {
            Self::Binary { rhs, .. } => *rhs = Some(child),
            Self::Unary { operand, .. } => *operand = Some(child),
            Self::Operand(_) => {}
        }
    }
}

/// Arena of the nodes of one expression run. Nodes are taken out as they are finished.
#[derive(Default)]
struct ExprBuilder {
    nodes: KeyVec<NodeId, Option<Node>>,
    run: Vec<NodeId>,
}

impl ExprBuilder {
    fn push(&mut self, node: Node) {
        let id = self.nodes.insert(Some(node));
        self.run.push(id);
    }

    /// A `-`, `*` or `&` is a prefix operator at the start of a run or after another operator.
    fn expects_operand(&self) -> bool {
        self.run.last().map_or(true, |&id| !self.is_complete(id))
    }

    fn line(&self, id: NodeId) -> usize {
        self.nodes[id].as_ref().map_or(0, Node::line)
    }

    fn is_complete(&self, id: NodeId) -> bool {
        self.nodes[id].as_ref().is_some_and(Node::is_complete)
    }

    fn open_left_power(&self, id: NodeId) -> Option<u8> {
        self.nodes[id].as_ref().and_then(Node::open_left_power)
    }

    fn open_right_power(&self, id: NodeId) -> Option<u8> {
        self.nodes[id].as_ref().and_then(Node::open_right_power)
    }

    fn fill_left(&mut self, target: NodeId, child: NodeId) {
        if let Some(node) = &mut self.nodes[target] {
            node.fill_left(child);
        }
    }

    fn fill_right(&mut self, target: NodeId, child: NodeId) {
        if let Some(node) = &mut self.nodes[target] {
            node.fill_right(child);
        }
    }

    fn take(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.get_mut(id).and_then(Option::take)
    }
}

impl Parser<'_, '_> {
    /// Parses an expression up to, but not including, one of the `terminators`.
    pub(super) fn parse_expr(&mut self, terminators: &[TokenKind]) -> CompileResult<Expr> {
        let start = self.lexer.peek();
        let mut builder = ExprBuilder::default();

        loop {
            let token = self.lexer.peek();
            if terminators.contains(&token.kind) {
                break;
            }

            let node = self.parse_node(&builder, token)?;
            builder.push(node);
        }

        if builder.run.is_empty() {
            return Err(self.error_expected("an expression", start));
        }

        let root = self.collapse(&mut builder)?;
        self.finish(&mut builder, Some(root), start.line)
    }

    /// Consumes the tokens of a single operand or operator placeholder.
    fn parse_node(&mut self, builder: &ExprBuilder, token: Token) -> CompileResult<Node> {
        let line = token.line;

        let node = match token.kind {
            TokenKind::Integer(n) => {
                self.lexer.next();
                Node::Operand(Expr::new(
                    ExprKind::Literal(Literal::Int(n)),
                    Type::Int,
                    line,
                ))
            }

            TokenKind::Float(f) => {
                self.lexer.next();
                Node::Operand(Expr::new(
                    ExprKind::Literal(Literal::Float(f)),
                    Type::Float,
                    line,
                ))
            }

            TokenKind::Identifier(name) => Node::Operand(self.parse_name(name, line)?),

            TokenKind::LParen => {
                self.lexer.next();

                if self.is_type_next() {
                    let ty = self.parse_type()?;
                    self.expect(TokenKind::RParen)?;

                    Node::Unary {
                        op: UnOp::Cast,
                        cast_ty: Some(ty),
                        operand: None,
                        line,
                    }
                } else {
                    let expr = self.parse_expr(&[TokenKind::RParen])?;
                    self.expect(TokenKind::RParen)?;

                    Node::Operand(expr)
                }
            }

            TokenKind::Bang => {
                self.lexer.next();
                Node::Unary {
                    op: UnOp::Not,
                    cast_ty: None,
                    operand: None,
                    line,
                }
            }

            kind => match (prefix_op(kind), binary_op(kind)) {
                (Some(op), _) if builder.expects_operand() => {
                    self.lexer.next();
                    Node::Unary {
                        op,
                        cast_ty: None,
                        operand: None,
                        line,
                    }
                }

                (_, Some(op)) => {
                    self.lexer.next();
                    Node::Binary {
                        op,
                        lhs: None,
                        rhs: None,
                        line,
                    }
                }

                _ => {
                    let token = self.next_token()?;
                    return Err(self.error(
                        ErrorKind::Syntax,
                        line,
                        format!("unexpected {} in expression", token.kind.token_name()),
                    ));
                }
            },
        };

        Ok(node)
    }

    /// Resolves an identifier as a variable, or as a function when followed by `(`.
    fn parse_name(&mut self, name: Istr, line: usize) -> CompileResult<Expr> {
        let is_call = self.lexer.peek2().kind == TokenKind::LParen;
        self.lexer.next();

        match (self.scopes.get(name), is_call) {
            (Some(Binding::Var(var)), false) => Ok(Expr::new(
                ExprKind::Var(var),
                self.symbols.vars[var].ty.clone(),
                line,
            )),

            (Some(Binding::Func(func)), true) => self.parse_call(func, line),

            (Some(Binding::Var(_)), true) => Err(self.error(
                ErrorKind::Scope,
                line,
                format!("`{}` is not a function", self.name(name)),
            )),

            (Some(Binding::Func(_)), false) => Err(self.error(
                ErrorKind::Scope,
                line,
                format!("`{}` is not a variable", self.name(name)),
            )),

            (None, _) => Err(self.error(
                ErrorKind::Scope,
                line,
                format!("no such symbol `{}`", self.name(name)),
            )),
        }
    }

    fn parse_call(&mut self, func: FuncId, line: usize) -> CompileResult<Expr> {
        self.expect(TokenKind::LParen)?;

        let params = self.symbols.funcs[func].params.clone();
        let ret_ty = self.symbols.funcs[func].ret_ty.clone();

        let mut args = vec![];

        if !self.eat(TokenKind::RParen) {
            loop {
                let Some(param_ty) = params.get(args.len()) else {
                    return Err(self.error(ErrorKind::Syntax, line, "too many arguments"));
                };

                let arg = self.parse_expr(&[TokenKind::Comma, TokenKind::RParen])?;
                let arg_line = arg.line;

                let arg = types::coerce(arg, param_ty).map_err(|err| self.type_error(arg_line, err))?;
                args.push(arg);

                let token = self.next_token()?;
                match token.kind {
                    TokenKind::Comma => {}
                    TokenKind::RParen => break,
                    _ => return Err(self.error_expected("`,` or `)`", token)),
                }
            }
        }

        if args.len() < params.len() {
            return Err(self.error(ErrorKind::Syntax, line, "not enough arguments"));
        }

        Ok(Expr::new(ExprKind::Call { func, args }, ret_ty, line))
    }

    /// Collapses the run into a single tree, returning its root.
    fn collapse(&self, builder: &mut ExprBuilder) -> CompileResult<NodeId> {
        let mut run = std::mem::take(&mut builder.run);

        while run.len() > 1 {
            let len_before = run.len();

            let mut i = 0;
            while i < run.len() && run.len() > 1 {
                let id = run[i];

                if !builder.is_complete(id) {
                    i += 1;
                    continue;
                }

                let left = i
                    .checked_sub(1)
                    .and_then(|prev| builder.open_right_power(run[prev]));
                let right = run
                    .get(i + 1)
                    .and_then(|&next| builder.open_left_power(next));

                match (left, right) {
                    (None, None) => {
                        return Err(self.error(
                            ErrorKind::Syntax,
                            builder.line(id),
                            "invalid combination of operators and operands",
                        ));
                    }

                    (Some(left), right) if right < Some(left) => {
                        builder.fill_right(run[i - 1], id);
                    }

                    _ => builder.fill_left(run[i + 1], id),
                }

                run.remove(i);
            }

            if run.len() == len_before {
                return Err(self.error(
                    ErrorKind::Syntax,
                    builder.line(run[0]),
                    "invalid expression",
                ));
            }
        }

        match run.first() {
            Some(&root) => Ok(root),
            None => Err(self.error(ErrorKind::Syntax, 0, "expected an expression")),
        }
    }

    /// Converts a collapsed tree into a typed expression, bottom up.
    fn finish(
        &self,
        builder: &mut ExprBuilder,
        hole: Option<NodeId>,
        line: usize,
    ) -> CompileResult<Expr> {
        let Some(node) = hole.and_then(|id| builder.take(id)) else {
            return Err(self.error(ErrorKind::Syntax, line, "invalid expression"));
        };

        match node {
            Node::Operand(expr) => Ok(expr),

            Node::Unary {
                op,
                cast_ty,
                operand,
                line,
            } => {
                let expr = self.finish(builder, operand, line)?;
                types::unary(op, cast_ty, expr, line).map_err(|err| self.type_error(line, err))
            }

            Node::Binary { op, lhs, rhs, line } => {
                let lhs = self.finish(builder, lhs, line)?;
                let rhs = self.finish(builder, rhs, line)?;
                types::binary(op, lhs, rhs, line).map_err(|err| self.type_error(line, err))
            }
        }
    }
}
