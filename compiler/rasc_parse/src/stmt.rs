//! Statement parsing.

use rasc_diagnostic::{Diagnostic, ErrorCode};
use rasc_ir::{ensure_sufficient_stack, AssignOp, ExprKind, IncDec, Span, Stmt, StmtKind, TokenKind};

use crate::{ParseResult, Parser};

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Eq => Some(AssignOp::Assign),
        TokenKind::PlusEq => Some(AssignOp::Add),
        TokenKind::MinusEq => Some(AssignOp::Sub),
        TokenKind::StarEq => Some(AssignOp::Mul),
        TokenKind::SlashEq => Some(AssignOp::Div),
        TokenKind::PercentEq => Some(AssignOp::Mod),
        _ => None,
    }
}

fn inc_dec(kind: TokenKind) -> Option<IncDec> {
    match kind {
        TokenKind::PlusPlus => Some(IncDec::Inc),
        TokenKind::MinusMinus => Some(IncDec::Dec),
        _ => None,
    }
}

impl Parser<'_> {
    pub(crate) fn statement(&mut self) -> ParseResult<Stmt> {
        ensure_sufficient_stack(|| self.statement_inner())
    }

    fn statement_inner(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::LBrace => return self.block(),
            TokenKind::Semicolon => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::If => self.if_stmt()?,
            TokenKind::While | TokenKind::Until => self.loop_stmt()?,
            TokenKind::Foreach => self.foreach_stmt()?,
            TokenKind::Break => {
                self.advance();
                self.expect(&TokenKind::Semicolon)?;
                StmtKind::Break
            }
            TokenKind::BreakIf => {
                self.advance();
                let open = self.expect(&TokenKind::LParen)?.span;
                let cond = self.expression()?;
                self.expect_closing(&TokenKind::RParen, open)?;
                self.expect(&TokenKind::Semicolon)?;
                StmtKind::BreakIf(cond)
            }
            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                self.advance();
                let op = if matches!(kind, TokenKind::PlusPlus) {
                    IncDec::Inc
                } else {
                    IncDec::Dec
                };
                let (target, target_span) = self.expect_ident()?;
                self.expect(&TokenKind::Semicolon)?;
                StmtKind::IncDec {
                    target,
                    target_span,
                    op,
                    prefix: true,
                }
            }
            TokenKind::Ident(target) => {
                if let Some(op) = assign_op(self.peek_kind(1)) {
                    let target_span = self.advance().span;
                    self.advance();
                    let value = self.expression()?;
                    self.expect(&TokenKind::Semicolon)?;
                    StmtKind::Assign {
                        target,
                        target_span,
                        op,
                        value,
                    }
                } else if let Some(op) = inc_dec(self.peek_kind(1)) {
                    let target_span = self.advance().span;
                    self.advance();
                    self.expect(&TokenKind::Semicolon)?;
                    StmtKind::IncDec {
                        target,
                        target_span,
                        op,
                        prefix: false,
                    }
                } else {
                    self.expr_stmt()?
                }
            }
            _ => self.expr_stmt()?,
        };
        Ok(self.finish(kind, start))
    }

    fn finish(&mut self, kind: StmtKind, start: Span) -> Stmt {
        Stmt {
            id: self.next_stmt_id(),
            kind,
            span: start.merge(self.previous_span()),
        }
    }

    fn expr_stmt(&mut self) -> ParseResult<StmtKind> {
        let expr = self.expression()?;
        let next = self.current_kind();
        if assign_op(next).is_some() || inc_dec(next).is_some() {
            return Err(Diagnostic::error(ErrorCode::E1001)
                .with_message(format!("cannot apply {next} to this expression"))
                .with_label(self.arena.span(expr), "only a variable name can be assigned")
                .with_secondary_label(self.current_span(), "assignment here"));
        }
        self.expect(&TokenKind::Semicolon)?;
        Ok(StmtKind::Expr(expr))
    }

    /// `'{' stmt* '}'`
    fn block(&mut self) -> ParseResult<Stmt> {
        let open = self.advance().span;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            match self.statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(diag) => {
                    self.diagnostics.push(diag);
                    self.recover();
                }
            }
        }
        self.expect_closing(&TokenKind::RBrace, open)?;
        Ok(self.finish(StmtKind::Block(stmts), open))
    }

    /// `'(' expr ')'`
    fn condition(&mut self) -> ParseResult<rasc_ir::ExprId> {
        let open = self.expect(&TokenKind::LParen)?.span;
        let cond = self.expression()?;
        self.expect_closing(&TokenKind::RParen, open)?;
        Ok(cond)
    }

    fn if_stmt(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let cond = self.condition()?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn loop_stmt(&mut self) -> ParseResult<StmtKind> {
        let keyword = self.advance().kind;
        let cond = self.condition()?;
        let body = Box::new(self.statement()?);
        Ok(if matches!(keyword, TokenKind::Until) {
            StmtKind::Until { cond, body }
        } else {
            StmtKind::While { cond, body }
        })
    }

    /// `'foreach' '(' IDENT 'in' expr (':' expr)? ')' stmt`
    fn foreach_stmt(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let open = self.expect(&TokenKind::LParen)?.span;
        let (var, var_span) = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let first = self.expression()?;
        let source = if self.eat(&TokenKind::Colon) {
            let end = self.expression()?;
            let span = self.arena.span(first).merge(self.arena.span(end));
            self.arena.alloc(ExprKind::Range { start: first, end }, span)
        } else {
            first
        };
        self.expect_closing(&TokenKind::RParen, open)?;
        let body = Box::new(self.statement()?);
        Ok(StmtKind::Foreach {
            var,
            var_span,
            source,
            body,
        })
    }
}
