#[cfg(test)]
mod tests;

mod expr;
mod stmt;

use cwat_interner::Istr;
use cwat_ir::ast::*;
use cwat_ir::symbols::*;
use cwat_ir::{Literal, Type, UnOp};

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::lexer::Lexer;
use crate::scope::{Binding, ScopeStack};
use crate::token::{Keyword, Token, TokenKind};
use crate::types::TypeError;

pub struct Parser<'src, 'int> {
    lexer: Lexer<'src, 'int>,

    scopes: ScopeStack,
    symbols: Symbols,
    externs: Vec<FuncId>,

    func: Option<FuncContext>,
    loop_depth: usize,
}

/// State of the function whose body is being parsed.
struct FuncContext {
    ret_ty: Type,
    locals: Vec<VarId>,
}

struct Signature {
    name: Istr,
    ret_ty: Type,
    params: Vec<Param>,
    line: usize,
}

struct Param {
    name: Istr,
    ty: Type,
    line: usize,
}

impl<'src, 'int> Parser<'src, 'int> {
    pub fn new(lexer: Lexer<'src, 'int>) -> Self {
        Self {
            lexer,

            scopes: ScopeStack::new(),
            symbols: Symbols::default(),
            externs: vec![],

            func: None,
            loop_depth: 0,
        }
    }

    pub fn parse_program(mut self) -> CompileResult<(Program, Symbols)> {
        let mut items = vec![];

        loop {
            let token = self.lexer.peek();

            match token.kind {
                TokenKind::Eof => break,

                TokenKind::Keyword(Keyword::Extern) => self.parse_extern()?,

                _ if self.is_function_next() => {
                    if let Some(func) = self.parse_function()? {
                        items.push(Item::Func(func));
                    }
                }

                _ if self.is_type_next() => items.push(Item::Global(self.parse_global()?)),

                _ => {
                    let token = self.next_token()?;
                    return Err(self.error(
                        ErrorKind::Syntax,
                        token.line,
                        "invalid high level declaration",
                    ));
                }
            }
        }

        if let Some(func) = self
            .symbols
            .funcs
            .iter()
            .find(|func| func.state == FuncState::Declared)
        {
            return Err(self.error(
                ErrorKind::Scope,
                func.line,
                format!("function `{}` is declared but never defined", self.name(func.name)),
            ));
        }

        log::debug!(
            "parsed {} items, {} variables, {} functions",
            items.len(),
            self.symbols.vars.len(),
            self.symbols.funcs.len()
        );

        let program = Program {
            items,
            externs: self.externs,
        };

        Ok((program, self.symbols))
    }

    /// Looks past a type and a name for the `(` that starts a function.
    fn is_function_next(&mut self) -> bool {
        let snapshot = self.lexer.snapshot();

        let is_function = self.skip_type()
            && matches!(self.lexer.next().kind, TokenKind::Identifier(_))
            && self.lexer.next().kind == TokenKind::LParen;

        self.lexer.restore(snapshot);
        is_function
    }

    fn skip_type(&mut self) -> bool {
        if !self.lexer.next().kind.is_type_keyword() {
            return false;
        }

        while self.lexer.peek().kind == TokenKind::Star {
            self.lexer.next();
        }

        true
    }

    fn is_type_next(&mut self) -> bool {
        self.lexer.peek().kind.is_type_keyword()
    }

    fn parse_extern(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::Keyword(Keyword::Extern))?;

        let sig = self.parse_signature()?;

        let token = self.next_token()?;
        match token.kind {
            TokenKind::Semicolon => {}
            TokenKind::LBrace => {
                return Err(self.error(
                    ErrorKind::Syntax,
                    token.line,
                    "extern functions cannot have a body",
                ));
            }
            _ => return Err(self.error_expected("`;`", token)),
        }

        let id = self.symbols.funcs.insert(FuncSymbol {
            name: sig.name,
            ret_ty: sig.ret_ty,
            params: sig.params.into_iter().map(|param| param.ty).collect(),
            state: FuncState::Extern,
            line: sig.line,
        });

        self.bind(sig.name, Binding::Func(id), sig.line)?;
        self.externs.push(id);

        Ok(())
    }

    /// Parses a function definition, or a forward declaration which yields no item.
    fn parse_function(&mut self) -> CompileResult<Option<Function>> {
        let sig = self.parse_signature()?;
        let id = self.declare_function(&sig)?;

        if self.eat(TokenKind::Semicolon) {
            return Ok(None);
        }

        if self.lexer.peek().kind != TokenKind::LBrace {
            let token = self.next_token()?;
            return Err(self.error_expected("`;` or `{`", token));
        }

        if self.symbols.funcs[id].state == FuncState::Defined {
            return Err(self.redefinition(sig.name, sig.line));
        }
        self.symbols.funcs[id].state = FuncState::Defined;

        log::trace!("parsing function `{}`", self.name(sig.name));

        self.func = Some(FuncContext {
            ret_ty: sig.ret_ty.clone(),
            locals: vec![],
        });

        // parameters live in the same scope as the top level of the body
        self.scopes.push_scope();

        let mut params = vec![];
        for param in sig.params {
            params.push(self.declare_var(param.name, param.ty, Storage::Local, param.line)?);
        }

        let body = self.parse_block_contents()?;

        self.scopes.pop_scope();

        let locals = self
            .func
            .take()
            .map(|func| func.locals)
            .unwrap_or_default();

        Ok(Some(Function {
            id,
            name: sig.name,
            ret_ty: sig.ret_ty,
            params,
            locals,
            body,
        }))
    }

    fn parse_signature(&mut self) -> CompileResult<Signature> {
        let ret_ty = self.parse_type()?;
        let (name, line) = self.expect_ident()?;

        self.expect(TokenKind::LParen)?;

        let mut params = vec![];
        if !self.eat(TokenKind::RParen) {
            loop {
                let ty = self.parse_type()?;
                let (name, line) = self.expect_ident()?;

                if ty == Type::Void {
                    return Err(self.void_variable(name, line));
                }

                params.push(Param { name, ty, line });

                let token = self.next_token()?;
                match token.kind {
                    TokenKind::Comma => {}
                    TokenKind::RParen => break,
                    _ => return Err(self.error_expected("`,` or `)`", token)),
                }
            }
        }

        Ok(Signature {
            name,
            ret_ty,
            params,
            line,
        })
    }

    /// Finds or creates the symbol of a non-extern function.
    fn declare_function(&mut self, sig: &Signature) -> CompileResult<FuncId> {
        let params: Vec<Type> = sig.params.iter().map(|param| param.ty.clone()).collect();

        match self.scopes.get(sig.name) {
            Some(Binding::Func(id)) => {
                let func = &self.symbols.funcs[id];

                if func.state == FuncState::Extern {
                    return Err(self.redefinition(sig.name, sig.line));
                }

                if func.ret_ty != sig.ret_ty || func.params != params {
                    return Err(self.error(
                        ErrorKind::Type,
                        sig.line,
                        format!("conflicting types for `{}`", self.name(sig.name)),
                    ));
                }

                Ok(id)
            }

            Some(Binding::Var(_)) => Err(self.redefinition(sig.name, sig.line)),

            None => {
                let id = self.symbols.funcs.insert(FuncSymbol {
                    name: sig.name,
                    ret_ty: sig.ret_ty.clone(),
                    params,
                    state: FuncState::Declared,
                    line: sig.line,
                });

                self.bind(sig.name, Binding::Func(id), sig.line)?;

                Ok(id)
            }
        }
    }

    fn parse_global(&mut self) -> CompileResult<GlobalDecl> {
        let (var, init) = self.parse_var_decl(Storage::Global)?;

        let init = match init {
            Some(expr) => match const_literal(&expr) {
                Some(literal) => Some(literal),
                None => {
                    return Err(self.error(
                        ErrorKind::Type,
                        expr.line,
                        "global initializer must be a constant",
                    ));
                }
            },
            None => None,
        };

        Ok(GlobalDecl { var, init })
    }

    /// Parses `type name ([len])* (= expr)? ;` and binds the variable in the current scope.
    fn parse_var_decl(&mut self, storage: Storage) -> CompileResult<(VarId, Option<Expr>)> {
        let base = self.parse_type()?;
        let (name, line) = self.expect_ident()?;

        if base == Type::Void {
            return Err(self.void_variable(name, line));
        }

        let mut lengths = vec![];
        while self.eat(TokenKind::LBracket) {
            let len = self.parse_expr(&[TokenKind::RBracket])?;

            let ExprKind::Literal(Literal::Int(n)) = len.kind else {
                return Err(self.error(
                    ErrorKind::Type,
                    len.line,
                    "array length must be a constant integer",
                ));
            };

            match u32::try_from(n) {
                Ok(n) if n > 0 => lengths.push(n),
                _ => {
                    return Err(self.error(
                        ErrorKind::Type,
                        len.line,
                        "array length must be positive",
                    ));
                }
            }

            self.expect(TokenKind::RBracket)?;
        }

        let ty = lengths
            .into_iter()
            .rev()
            .fold(base, |ty, len| Type::Array(Box::new(ty), len));

        let init = if self.eat(TokenKind::Eq) {
            if matches!(ty, Type::Array(..)) {
                return Err(self.error(
                    ErrorKind::Type,
                    line,
                    "arrays cannot have initializers",
                ));
            }

            let expr = self.parse_expr(&[TokenKind::Semicolon])?;
            let expr_line = expr.line;

            let expr = crate::types::coerce(expr, &ty)
                .map_err(|err| self.type_error(expr_line, err))?;

            Some(expr)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon)?;

        let var = self.declare_var(name, ty, storage, line)?;

        Ok((var, init))
    }

    fn declare_var(
        &mut self,
        name: Istr,
        ty: Type,
        storage: Storage,
        line: usize,
    ) -> CompileResult<VarId> {
        let id = self.symbols.vars.insert(VarSymbol {
            name,
            ty,
            storage,
            line,
        });

        self.bind(name, Binding::Var(id), line)?;

        if let Some(func) = &mut self.func {
            func.locals.push(id);
        }

        Ok(id)
    }

    fn bind(&mut self, name: Istr, binding: Binding, line: usize) -> CompileResult<()> {
        self.scopes
            .add(name, binding)
            .map_err(|_| self.redefinition(name, line))
    }

    fn parse_type(&mut self) -> CompileResult<Type> {
        let token = self.next_token()?;

        let mut ty = match token.kind {
            TokenKind::Keyword(Keyword::Int) => Type::Int,
            TokenKind::Keyword(Keyword::Float) => Type::Float,
            TokenKind::Keyword(Keyword::Void) => Type::Void,
            _ => return Err(self.error_expected("a type", token)),
        };

        while self.eat(TokenKind::Star) {
            ty = ty.pointer_to();
        }

        Ok(ty)
    }

    fn expect_ident(&mut self) -> CompileResult<(Istr, usize)> {
        let token = self.next_token()?;

        match token.kind {
            TokenKind::Identifier(name) => Ok((name, token.line)),
            _ => Err(self.error_expected("an identifier", token)),
        }
    }

    /// Consumes the next token, turning lexer errors into compile errors.
    fn next_token(&mut self) -> CompileResult<Token> {
        let token = self.lexer.next();

        match token.kind {
            TokenKind::Error(err) => Err(self.error(ErrorKind::Lex, token.line, err.to_string())),
            _ => Ok(token),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        let token = self.next_token()?;

        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.error_expected(kind.token_name(), token))
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.lexer.peek().kind == kind {
            self.lexer.next();
            true
        } else {
            false
        }
    }

    fn name(&self, name: Istr) -> &str {
        &self.lexer.interner()[name]
    }

    fn error(&self, kind: ErrorKind, line: usize, message: impl Into<String>) -> CompileError {
        CompileError {
            kind,
            line,
            message: message.into(),
            source_line: self.lexer.source_line(line).trim().to_owned(),
        }
    }

    fn error_expected(&self, expected: &str, found: Token) -> CompileError {
        self.error(
            ErrorKind::Syntax,
            found.line,
            format!("expected {expected}, found {}", found.kind.token_name()),
        )
    }

    fn type_error(&self, line: usize, err: TypeError) -> CompileError {
        self.error(ErrorKind::Type, line, err.to_string())
    }

    fn redefinition(&self, name: Istr, line: usize) -> CompileError {
        self.error(
            ErrorKind::Scope,
            line,
            format!("redefinition of the symbol `{}`", self.name(name)),
        )
    }

    fn void_variable(&self, name: Istr, line: usize) -> CompileError {
        self.error(
            ErrorKind::Type,
            line,
            format!("`{}` cannot have type `void`", self.name(name)),
        )
    }
}

/// Folds a global initializer into a literal of its type.
fn const_literal(expr: &Expr) -> Option<Literal> {
    match &expr.kind {
        ExprKind::Literal(literal) => Some(*literal),

        ExprKind::UnOp {
            op: UnOp::Negate,
            expr: inner,
        } => match const_literal(inner)? {
            Literal::Int(n) => Some(Literal::Int(n.wrapping_neg())),
            Literal::Float(f) => Some(Literal::Float(-f)),
        },

        ExprKind::UnOp {
            op: UnOp::Cast,
            expr: inner,
        } => match (const_literal(inner)?, &expr.ty) {
            (Literal::Int(n), Type::Float) => Some(Literal::Float(n as f32)),
            (Literal::Float(f), Type::Int) => Some(Literal::Int(f as i32)),
            (literal, _) => Some(literal),
        },

        _ => None,
    }
}
