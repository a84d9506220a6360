//! Parser for rasc scripts.
//!
//! Recursive descent over the token list:
//! - Expressions go into an `ExprArena`, children are `ExprId`s
//! - Statements are a small owned tree tagged with `StmtId`s
//! - Errors are collected and parsing resumes at the next `;` or `}`

mod blocks;
mod expr;
mod stmt;

use rasc_diagnostic::{unexpected_token, Diagnostic, ErrorCode};
use rasc_ir::{ExprArena, Script, Span, StmtId, Token, TokenKind, TokenList};

/// Parser output. `script` is always produced, even with errors.
#[derive(Debug)]
pub struct ParseOutput {
    pub script: Script,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parse a token list into a [`Script`].
#[tracing::instrument(level = "debug", skip_all)]
pub fn parse(tokens: &TokenList) -> ParseOutput {
    let output = Parser::new(tokens).parse_script();
    tracing::debug!(
        statements = output.script.body.len(),
        expressions = output.script.arena.len(),
        errors = output.diagnostics.len(),
        "parsing complete"
    );
    output
}

type ParseResult<T> = Result<T, Diagnostic>;

/// Parser state.
pub(crate) struct Parser<'t> {
    tokens: &'t TokenList,
    pos: usize,
    arena: ExprArena,
    diagnostics: Vec<Diagnostic>,
    next_stmt: u32,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t TokenList) -> Self {
        Parser {
            tokens,
            pos: 0,
            arena: ExprArena::new(),
            diagnostics: Vec::new(),
            next_stmt: 0,
        }
    }

    fn parse_script(mut self) -> ParseOutput {
        let mut script = Script::default();

        while !self.at_end() {
            if self.at_header_keyword() {
                if !script.body.is_empty() {
                    let span = self.current_span();
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E1005)
                            .with_message(format!(
                                "{} block must come before the script body",
                                self.current_kind()
                            ))
                            .with_label(span, "move this block to the top of the script"),
                    );
                }
                self.header_block(&mut script);
                continue;
            }

            if self.check(&TokenKind::RBrace) {
                let token = self.advance();
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E1001)
                        .with_message("unmatched `}`")
                        .with_label(token.span, "no block to close"),
                );
                continue;
            }

            match self.statement() {
                Ok(stmt) => script.body.push(stmt),
                Err(diag) => {
                    self.diagnostics.push(diag);
                    self.recover();
                }
            }
        }

        script.arena = self.arena;
        script.stmt_count = self.next_stmt;
        ParseOutput {
            script,
            diagnostics: self.diagnostics,
        }
    }

    // ===== Token access =====

    fn current(&self) -> Token {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens.get(self.pos + offset).kind
    }

    fn previous_span(&self) -> Span {
        if self.pos == 0 {
            Span::DUMMY
        } else {
            self.tokens.get(self.pos - 1).span
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn at_header_keyword(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Options | TokenKind::Images | TokenKind::Init
        )
    }

    fn advance(&mut self) -> Token {
        let token = self.current();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind().same_kind(kind)
    }

    /// Consume the current token if it matches `kind`.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(kind.describe()))
        }
    }

    /// Expect a closing delimiter, pointing back at its opener on failure.
    fn expect_closing(&mut self, kind: &TokenKind, open: Span) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        if self.at_end() {
            return Err(Diagnostic::error(ErrorCode::E1003)
                .with_message(format!("unclosed delimiter, expected {}", kind.describe()))
                .with_label(self.current_span(), "reached end of input")
                .with_secondary_label(open, "opened here"));
        }
        Err(self.error_expected(kind.describe()))
    }

    fn expect_ident(&mut self) -> ParseResult<(rasc_ir::Name, Span)> {
        let token = self.current();
        if let TokenKind::Ident(name) = token.kind {
            self.advance();
            Ok((name, token.span))
        } else {
            Err(Diagnostic::error(ErrorCode::E1004)
                .with_message(format!("expected identifier, found {}", token.kind))
                .with_label(token.span, "expected identifier"))
        }
    }

    fn error_expected(&self, expected: &str) -> Diagnostic {
        let token = self.current();
        unexpected_token(token.span, expected, token.kind.describe())
    }

    fn next_stmt_id(&mut self) -> StmtId {
        let id = StmtId::new(self.next_stmt);
        self.next_stmt += 1;
        id
    }

    /// Skip to just past the next `;`, or up to the next `}` or header block.
    ///
    /// Callers never start a statement at `}`, so this always makes
    /// progress unless already at the end.
    fn recover(&mut self) {
        let start = self.pos;
        while !self.at_end() {
            match self.current_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                TokenKind::Options | TokenKind::Images | TokenKind::Init => {
                    if self.pos == start {
                        self.advance();
                    }
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
