use super::*;
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut interner = StringInterner::new();
    lex(source, &mut interner)
        .tokens
        .iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_lex_assignment() {
    let mut interner = StringInterner::new();
    let output = lex("dest = x() + 1.5;", &mut interner);
    assert!(output.diagnostics.is_empty());
    let dest = interner.intern("dest");
    let x = interner.intern("x");
    let got: Vec<_> = output.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        got,
        vec![
            TokenKind::Ident(dest),
            TokenKind::Eq,
            TokenKind::Ident(x),
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Plus,
            TokenKind::Number(1.5),
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_numbers() {
    assert_eq!(
        kinds("123 1.5 .5 1e-3 2E2"),
        vec![
            TokenKind::Number(123.0),
            TokenKind::Number(1.5),
            TokenKind::Number(0.5),
            TokenKind::Number(0.001),
            TokenKind::Number(200.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_keywords_and_multichar_operators() {
    assert_eq!(
        kinds("foreach breakif NaN null ^| ^ ++ += <= == != && ||"),
        vec![
            TokenKind::Foreach,
            TokenKind::BreakIf,
            TokenKind::NaN,
            TokenKind::Null,
            TokenKind::CaretPipe,
            TokenKind::Caret,
            TokenKind::PlusPlus,
            TokenKind::PlusEq,
            TokenKind::LtEq,
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    let mut interner = StringInterner::new();
    let output = lex("inside iff", &mut interner);
    assert!(matches!(output.tokens.get(0).kind, TokenKind::Ident(_)));
    assert!(matches!(output.tokens.get(1).kind, TokenKind::Ident(_)));
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("a // trailing\n/* block\n * comment */ ;"),
        vec![
            kinds("a")[0],
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_invalid_character() {
    let mut interner = StringInterner::new();
    let output = lex("a = #;", &mut interner);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E0001);
    assert_eq!(output.tokens.get(2).kind, TokenKind::Error);
    assert_eq!(output.tokens.get(2).span, Span::new(4, 5));
}

#[test]
fn test_unterminated_comment() {
    let mut interner = StringInterner::new();
    let output = lex("a; /* never closed", &mut interner);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E0003);
    assert_eq!(output.tokens.len(), 3); // a ; EOF
}

#[test]
fn test_eof_span_is_end_of_source() {
    let mut interner = StringInterner::new();
    let output = lex("ab ", &mut interner);
    assert_eq!(output.tokens.get(99).kind, TokenKind::Eof);
    assert_eq!(output.tokens.get(99).span, Span::point(3));
}
