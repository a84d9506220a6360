//! Expression parsing: operators, calls, lists and image references.

use rasc_diagnostic::{Diagnostic, ErrorCode};
use rasc_ir::{
    ensure_sufficient_stack, Axis, BinaryOp, ExprId, ExprKind, ExprRange, PixelPos, Span,
    TokenKind, UnaryOp,
};

use crate::{ParseResult, Parser};

/// Binding power of a binary operator; higher binds tighter.
fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    let entry = match kind {
        TokenKind::PipePipe => (BinaryOp::Or, 1),
        TokenKind::CaretPipe => (BinaryOp::Xor, 2),
        TokenKind::AmpAmp => (BinaryOp::And, 3),
        TokenKind::EqEq => (BinaryOp::Eq, 4),
        TokenKind::NotEq => (BinaryOp::NotEq, 4),
        TokenKind::Lt => (BinaryOp::Lt, 5),
        TokenKind::LtEq => (BinaryOp::LtEq, 5),
        TokenKind::Gt => (BinaryOp::Gt, 5),
        TokenKind::GtEq => (BinaryOp::GtEq, 5),
        TokenKind::Plus => (BinaryOp::Add, 6),
        TokenKind::Minus => (BinaryOp::Sub, 6),
        TokenKind::Star => (BinaryOp::Mul, 7),
        TokenKind::Slash => (BinaryOp::Div, 7),
        TokenKind::Percent => (BinaryOp::Mod, 7),
        _ => return None,
    };
    Some(entry)
}

impl Parser<'_> {
    /// `expr := or ('?' expr ':' expr)?`
    pub(crate) fn expression(&mut self) -> ParseResult<ExprId> {
        ensure_sufficient_stack(|| {
            let cond = self.binary(1)?;
            if !self.eat(&TokenKind::Question) {
                return Ok(cond);
            }
            let then_expr = self.expression()?;
            self.expect(&TokenKind::Colon)?;
            let else_expr = self.expression()?;
            let span = self.arena.span(cond).merge(self.arena.span(else_expr));
            Ok(self.arena.alloc(
                ExprKind::Ternary {
                    cond,
                    then_expr,
                    else_expr,
                },
                span,
            ))
        })
    }

    /// Left-associative binary operators with binding power >= `min_prec`.
    fn binary(&mut self, min_prec: u8) -> ParseResult<ExprId> {
        let mut left = self.unary()?;
        while let Some((op, prec)) = binary_op(self.current_kind()) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.binary(prec + 1)?;
            let span = self.arena.span(left).merge(self.arena.span(right));
            left = self.arena.alloc(ExprKind::Binary { op, left, right }, span);
        }
        Ok(left)
    }

    /// `unary := ('!' | '-' | '+') unary | power`
    fn unary(&mut self) -> ParseResult<ExprId> {
        let op = match self.current_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.power(),
        };
        let start = self.advance().span;
        let operand = ensure_sufficient_stack(|| self.unary())?;
        let span = start.merge(self.arena.span(operand));
        Ok(self.arena.alloc(ExprKind::Unary { op, operand }, span))
    }

    /// `power := postfix ('^' unary)?`, right associative through `unary`.
    fn power(&mut self) -> ParseResult<ExprId> {
        let base = self.postfix()?;
        if !self.eat(&TokenKind::Caret) {
            return Ok(base);
        }
        let exponent = ensure_sufficient_stack(|| self.unary())?;
        let span = self.arena.span(base).merge(self.arena.span(exponent));
        Ok(self.arena.alloc(
            ExprKind::Binary {
                op: BinaryOp::Pow,
                left: base,
                right: exponent,
            },
            span,
        ))
    }

    fn postfix(&mut self) -> ParseResult<ExprId> {
        let token = self.current();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(self.arena.alloc(ExprKind::Number(n), token.span))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                let value = matches!(token.kind, TokenKind::True);
                Ok(self.arena.alloc(ExprKind::Bool(value), token.span))
            }
            TokenKind::Null | TokenKind::NaN => {
                self.advance();
                Ok(self.arena.alloc(ExprKind::Null, token.span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect_closing(&TokenKind::RParen, token.span)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let (items, close) = self.comma_list(&TokenKind::RBracket, token.span)?;
                Ok(self.arena.alloc(ExprKind::List(items), token.span.merge(close)))
            }
            TokenKind::Ident(name) => {
                self.advance();
                match self.current_kind() {
                    TokenKind::LParen => {
                        let open = self.advance().span;
                        let (args, close) = self.comma_list(&TokenKind::RParen, open)?;
                        Ok(self.arena.alloc(
                            ExprKind::Call { func: name, args },
                            token.span.merge(close),
                        ))
                    }
                    TokenKind::LBracket => self.image_spec(name, token.span),
                    _ => Ok(self.arena.alloc(ExprKind::Ident(name), token.span)),
                }
            }
            TokenKind::Eof => Err(Diagnostic::error(ErrorCode::E1002)
                .with_message("expected expression, found end of input")
                .with_label(token.span, "expected expression")),
            _ => Err(Diagnostic::error(ErrorCode::E1002)
                .with_message(format!("expected expression, found {}", token.kind))
                .with_label(token.span, "expected expression")),
        }
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn comma_list(&mut self, close: &TokenKind, open: Span) -> ParseResult<(ExprRange, Span)> {
        let mut items = Vec::new();
        if !self.check(close) {
            loop {
                items.push(self.expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.expect_closing(close, open)?.span;
        Ok((self.arena.alloc_list(items), end))
    }

    /// `name[x, y]`, `name[x, y][band]` or `name[band]`.
    fn image_spec(&mut self, name: rasc_ir::Name, name_span: Span) -> ParseResult<ExprId> {
        let open = self.advance().span;
        let first = self.axis()?;

        let (pos, band, end) = if self.eat(&TokenKind::Comma) {
            let second = self.axis()?;
            let mut end = self.expect_closing(&TokenKind::RBracket, open)?.span;
            let band = if self.check(&TokenKind::LBracket) {
                let band_open = self.advance().span;
                let band = self.expression()?;
                end = self.expect_closing(&TokenKind::RBracket, band_open)?.span;
                Some(band)
            } else {
                None
            };
            let pos = PixelPos {
                x: first,
                y: second,
            };
            (Some(pos), band, end)
        } else {
            let end = self.expect_closing(&TokenKind::RBracket, open)?.span;
            if first.absolute {
                return Err(Diagnostic::error(ErrorCode::E1006)
                    .with_message("`$` marks a position component, but this is a band index")
                    .with_label(self.arena.span(first.expr), "single index selects a band")
                    .with_note("write `name[$x, $y]` for an absolute position"));
            }
            (None, Some(first.expr), end)
        };

        Ok(self.arena.alloc(
            ExprKind::Indexed { name, pos, band },
            name_span.merge(end),
        ))
    }

    /// `pos := '$'? expr`
    fn axis(&mut self) -> ParseResult<Axis> {
        let absolute = self.eat(&TokenKind::Dollar);
        let expr = self.expression()?;
        Ok(Axis { expr, absolute })
    }
}
