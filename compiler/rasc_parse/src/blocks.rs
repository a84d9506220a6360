//! Header blocks: `options { .. }`, `images { .. }`, `init { .. }`.

use rasc_diagnostic::{Diagnostic, ErrorCode};
use rasc_ir::{ImageDecl, ImageRole, InitDecl, OptionDecl, OptionValue, Script, Span, TokenKind};

use crate::{ParseResult, Parser};

impl Parser<'_> {
    /// Parse one header block into `script`. Entries that fail to parse
    /// are reported and skipped; the rest of the block is still read.
    pub(crate) fn header_block(&mut self, script: &mut Script) {
        let keyword = self.advance();
        let open = match self.expect(&TokenKind::LBrace) {
            Ok(token) => token.span,
            Err(diag) => {
                self.diagnostics.push(diag);
                self.recover();
                return;
            }
        };

        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let entry = match keyword.kind {
                TokenKind::Options => self.option_entry().map(|d| script.options.push(d)),
                TokenKind::Images => self.image_entry().map(|d| script.images.push(d)),
                _ => self.init_entry().map(|d| script.init.push(d)),
            };
            if let Err(diag) = entry {
                self.diagnostics.push(diag);
                self.recover();
            }
        }

        if let Err(diag) = self.expect_closing(&TokenKind::RBrace, open) {
            self.diagnostics.push(diag);
        }
    }

    /// `IDENT '=' optval ';'`
    fn option_entry(&mut self) -> ParseResult<OptionDecl> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(&TokenKind::Eq)?;

        let start = self.current_span();
        let negate = self.eat(&TokenKind::Minus);
        let token = self.advance();
        let value = match token.kind {
            TokenKind::Number(n) => OptionValue::Number(if negate { -n } else { n }),
            TokenKind::Null | TokenKind::NaN if !negate => OptionValue::Null,
            TokenKind::True if !negate => OptionValue::Bool(true),
            TokenKind::False if !negate => OptionValue::Bool(false),
            TokenKind::Ident(id) if !negate => OptionValue::Ident(id),
            _ => {
                return Err(Diagnostic::error(ErrorCode::E1001)
                    .with_message(format!("expected option value, found {}", token.kind))
                    .with_label(token.span, "expected a number, `null` or a name"));
            }
        };
        let value_span = start.merge(token.span);
        self.expect(&TokenKind::Semicolon)?;

        Ok(OptionDecl {
            name,
            value,
            name_span,
            value_span,
        })
    }

    /// `IDENT '=' ('read' | 'write') ';'`
    fn image_entry(&mut self) -> ParseResult<ImageDecl> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(&TokenKind::Eq)?;
        let role = match self.current_kind() {
            TokenKind::Read => ImageRole::Source,
            TokenKind::Write => ImageRole::Dest,
            _ => return Err(self.error_expected("`read` or `write`")),
        };
        let end = self.advance().span;
        self.expect(&TokenKind::Semicolon)?;
        Ok(ImageDecl {
            name,
            role,
            span: name_span.merge(end),
        })
    }

    /// `IDENT ('=' expr)? ';'`
    fn init_entry(&mut self) -> ParseResult<InitDecl> {
        let (name, name_span) = self.expect_ident()?;
        let default = if self.eat(&TokenKind::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        let end: Span = self.previous_span();
        self.expect(&TokenKind::Semicolon)?;
        Ok(InitDecl {
            name,
            default,
            span: name_span.merge(end),
        })
    }
}
