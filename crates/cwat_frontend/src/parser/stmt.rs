use cwat_ir::ast::*;
use cwat_ir::symbols::Storage;
use cwat_ir::Type;

use super::Parser;
use crate::error::{CompileResult, ErrorKind};
use crate::token::{Keyword, TokenKind};
use crate::types;

impl Parser<'_, '_> {
    /// Parses `{ stmt* }` without opening a new scope.
    pub(super) fn parse_block_contents(&mut self) -> CompileResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace)?;

        let mut stmts = vec![];

        loop {
            let token = self.lexer.peek();

            match token.kind {
                TokenKind::RBrace => {
                    self.lexer.next();
                    break;
                }
                TokenKind::Eof => return Err(self.error_expected("`}`", token)),
                _ => stmts.push(self.parse_statement()?),
            }
        }

        Ok(stmts)
    }

    fn parse_block(&mut self) -> CompileResult<Vec<Stmt>> {
        self.scopes.push_scope();
        let stmts = self.parse_block_contents();
        self.scopes.pop_scope();

        stmts
    }

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        if self.is_type_next() {
            let (var, init) = self.parse_var_decl(Storage::Local)?;
            return Ok(Stmt::VarDecl { var, init });
        }

        let token = self.lexer.peek();

        match token.kind {
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Keyword(Keyword::If) => self.parse_if().map(Stmt::If),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),

            TokenKind::Keyword(kw @ (Keyword::Break | Keyword::Continue)) => {
                self.lexer.next();

                let (stmt, name) = match kw {
                    Keyword::Break => (Stmt::Break, "break"),
                    _ => (Stmt::Continue, "continue"),
                };

                if self.loop_depth == 0 {
                    return Err(self.error(
                        ErrorKind::Syntax,
                        token.line,
                        format!("`{name}` outside of a loop"),
                    ));
                }

                self.expect(TokenKind::Semicolon)?;
                Ok(stmt)
            }

            _ => {
                let expr = self.parse_expr(&[TokenKind::Semicolon])?;
                self.expect(TokenKind::Semicolon)?;

                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_return(&mut self) -> CompileResult<Stmt> {
        let token = self.expect(TokenKind::Keyword(Keyword::Return))?;

        let ret_ty = self
            .func
            .as_ref()
            .map_or(Type::Void, |func| func.ret_ty.clone());

        if self.eat(TokenKind::Semicolon) {
            if ret_ty != Type::Void {
                return Err(self.error(
                    ErrorKind::Type,
                    token.line,
                    format!("function returning `{ret_ty}` must return a value"),
                ));
            }

            return Ok(Stmt::Return(None));
        }

        let expr = self.parse_expr(&[TokenKind::Semicolon])?;
        let line = expr.line;

        if ret_ty == Type::Void {
            return Err(self.error(
                ErrorKind::Type,
                line,
                "void function cannot return a value",
            ));
        }

        let expr = types::coerce(expr, &ret_ty).map_err(|err| self.type_error(line, err))?;

        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Return(Some(expr)))
    }

    fn parse_if(&mut self) -> CompileResult<IfStmt> {
        self.expect(TokenKind::Keyword(Keyword::If))?;

        let cond = self.parse_condition()?;
        let body = self.parse_block()?;

        let next = if self.eat(TokenKind::Keyword(Keyword::Else)) {
            let next = if self.lexer.peek().kind == TokenKind::Keyword(Keyword::If) {
                Else::If(self.parse_if()?)
            } else {
                Else::Block(self.parse_block()?)
            };

            Some(Box::new(next))
        } else {
            None
        };

        Ok(IfStmt { cond, body, next })
    }

    fn parse_while(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::Keyword(Keyword::While))?;

        let cond = self.parse_condition()?;

        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;

        Ok(Stmt::While { cond, body: body? })
    }

    fn parse_condition(&mut self) -> CompileResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr(&[TokenKind::RParen])?;
        self.expect(TokenKind::RParen)?;

        if cond.ty == Type::Void {
            return Err(self.error(ErrorKind::Type, cond.line, "condition cannot be void"));
        }

        Ok(cond)
    }
}
