//! Lexer for rasc scripts using logos.
//!
//! Identifiers are interned as they are produced. Whitespace and comments
//! are dropped. Invalid input becomes a `TokenKind::Error` token plus a
//! diagnostic, so the parser always sees a complete, `Eof`-terminated list.

use logos::Logos;
use rasc_diagnostic::{Diagnostic, ErrorCode};
use rasc_ir::{Span, StringInterner, Token, TokenKind, TokenList};

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    // === Comments ===
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Comment,

    /// A `/*` with no closing `*/`.
    #[token("/*")]
    UnterminatedComment,

    // === Keywords ===
    #[token("options")]
    Options,
    #[token("images")]
    Images,
    #[token("init")]
    Init,
    #[token("read")]
    Read,
    #[token("write")]
    Write,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("until")]
    Until,
    #[token("foreach")]
    Foreach,
    #[token("in")]
    In,
    #[token("break")]
    Break,
    #[token("breakif")]
    BreakIf,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("NaN")]
    NaN,

    // === Punctuation ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token("$")]
    Dollar,

    // === Assignment ===
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("^|")]
    CaretPipe,
    #[token("!")]
    Bang,

    // === Literals ===
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Lexer output.
#[derive(Clone, Debug, Default)]
pub struct LexOutput {
    pub tokens: TokenList,
    pub diagnostics: Vec<Diagnostic>,
}

/// Tokenize `source`, interning identifiers into `interner`.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn lex(source: &str, interner: &mut StringInterner) -> LexOutput {
    let mut output = LexOutput::default();
    let mut logos = RawToken::lexer(source);

    while let Some(result) = logos.next() {
        let span = Span::from_range(logos.span());
        let slice = logos.slice();

        match result {
            Ok(RawToken::UnterminatedComment) => {
                output.diagnostics.push(
                    Diagnostic::error(ErrorCode::E0003)
                        .with_message("unterminated block comment")
                        .with_label(span, "comment starts here"),
                );
                break;
            }
            Ok(raw) => {
                let kind = convert_token(raw, slice, interner);
                output.tokens.push(Token::new(kind, span));
            }
            Err(()) => {
                output.diagnostics.push(invalid_token(span, slice));
                output.tokens.push(Token::new(TokenKind::Error, span));
            }
        }
    }

    let eof = Span::point(u32::try_from(source.len()).unwrap_or(u32::MAX));
    output.tokens.push(Token::new(TokenKind::Eof, eof));

    tracing::debug!(
        tokens = output.tokens.len(),
        errors = output.diagnostics.len(),
        "lexing complete"
    );
    output
}

#[cold]
fn invalid_token(span: Span, slice: &str) -> Diagnostic {
    if slice.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        Diagnostic::error(ErrorCode::E0002)
            .with_message(format!("invalid number literal `{slice}`"))
            .with_label(span, "not a valid number")
    } else {
        Diagnostic::error(ErrorCode::E0001)
            .with_message(format!("invalid character `{}`", slice.escape_debug()))
            .with_label(span, "unexpected character")
    }
}

fn convert_token(raw: RawToken, slice: &str, interner: &mut StringInterner) -> TokenKind {
    match raw {
        RawToken::Number(n) => TokenKind::Number(n),
        RawToken::Ident => TokenKind::Ident(interner.intern(slice)),

        RawToken::Options => TokenKind::Options,
        RawToken::Images => TokenKind::Images,
        RawToken::Init => TokenKind::Init,
        RawToken::Read => TokenKind::Read,
        RawToken::Write => TokenKind::Write,
        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::While => TokenKind::While,
        RawToken::Until => TokenKind::Until,
        RawToken::Foreach => TokenKind::Foreach,
        RawToken::In => TokenKind::In,
        RawToken::Break => TokenKind::Break,
        RawToken::BreakIf => TokenKind::BreakIf,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::Null => TokenKind::Null,
        RawToken::NaN => TokenKind::NaN,

        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Question => TokenKind::Question,
        RawToken::Dollar => TokenKind::Dollar,

        RawToken::Eq => TokenKind::Eq,
        RawToken::PlusEq => TokenKind::PlusEq,
        RawToken::MinusEq => TokenKind::MinusEq,
        RawToken::StarEq => TokenKind::StarEq,
        RawToken::SlashEq => TokenKind::SlashEq,
        RawToken::PercentEq => TokenKind::PercentEq,
        RawToken::PlusPlus => TokenKind::PlusPlus,
        RawToken::MinusMinus => TokenKind::MinusMinus,

        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Caret => TokenKind::Caret,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::PipePipe => TokenKind::PipePipe,
        RawToken::CaretPipe => TokenKind::CaretPipe,
        RawToken::Bang => TokenKind::Bang,

        // Skipped by logos or handled by the caller.
        RawToken::Comment | RawToken::UnterminatedComment => TokenKind::Error,
    }
}

#[cfg(test)]
mod tests;
