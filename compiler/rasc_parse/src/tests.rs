use super::*;
use pretty_assertions::assert_eq;
use rasc_diagnostic::ErrorCode;
use rasc_ir::{
    AssignOp, ExprId, ExprKind, ImageRole, IncDec, OptionValue, StmtKind,
    StringInterner, UnaryOp,
};

fn parse_str(source: &str) -> (ParseOutput, StringInterner) {
    let mut interner = StringInterner::new();
    let lexed = rasc_lexer::lex(source, &mut interner);
    assert!(lexed.diagnostics.is_empty(), "lex errors: {:?}", lexed.diagnostics);
    (parse(&lexed.tokens), interner)
}

fn parse_ok(source: &str) -> (Script, StringInterner) {
    let (output, interner) = parse_str(source);
    assert!(
        output.diagnostics.is_empty(),
        "unexpected errors: {:?}",
        output.diagnostics
    );
    (output.script, interner)
}

/// Render an expression back to a fully parenthesized string.
fn show(script: &Script, interner: &StringInterner, id: ExprId) -> String {
    let arena = &script.arena;
    match arena.kind(id) {
        ExprKind::Number(n) => format!("{n}"),
        ExprKind::Bool(b) => format!("{b}"),
        ExprKind::Null => "null".to_string(),
        ExprKind::Ident(name) => interner.lookup(*name).to_string(),
        ExprKind::Call { func, args } => {
            let args: Vec<_> = arena
                .list(*args)
                .iter()
                .map(|a| show(script, interner, *a))
                .collect();
            format!("{}({})", interner.lookup(*func), args.join(", "))
        }
        ExprKind::List(items) => {
            let items: Vec<_> = arena
                .list(*items)
                .iter()
                .map(|a| show(script, interner, *a))
                .collect();
            format!("[{}]", items.join(", "))
        }
        ExprKind::Indexed { name, pos, band } => {
            let mut out = interner.lookup(*name).to_string();
            if let Some(pos) = pos {
                let axis = |a: rasc_ir::Axis| {
                    format!(
                        "{}{}",
                        if a.absolute { "$" } else { "" },
                        show(script, interner, a.expr)
                    )
                };
                out.push_str(&format!("[{}, {}]", axis(pos.x), axis(pos.y)));
            }
            if let Some(band) = band {
                out.push_str(&format!("[{}]", show(script, interner, *band)));
            }
            out
        }
        ExprKind::Unary { op, operand } => {
            format!("({}{})", op.symbol(), show(script, interner, *operand))
        }
        ExprKind::Binary { op, left, right } => format!(
            "({} {} {})",
            show(script, interner, *left),
            op.symbol(),
            show(script, interner, *right)
        ),
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => format!(
            "({} ? {} : {})",
            show(script, interner, *cond),
            show(script, interner, *then_expr),
            show(script, interner, *else_expr)
        ),
        ExprKind::Range { start, end } => format!(
            "{}:{}",
            show(script, interner, *start),
            show(script, interner, *end)
        ),
    }
}

fn expr_of(source: &str) -> String {
    let (script, interner) = parse_ok(&format!("a = {source};"));
    match &script.body[0].kind {
        StmtKind::Assign { value, .. } => show(&script, &interner, *value),
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn test_precedence() {
    assert_eq!(expr_of("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(expr_of("1 - 2 - 3"), "((1 - 2) - 3)");
    assert_eq!(expr_of("a || b ^| c && d"), "(a || (b ^| (c && d)))");
    assert_eq!(expr_of("a == b < c"), "(a == (b < c))");
    assert_eq!(expr_of("!a && b"), "((!a) && b)");
}

#[test]
fn test_power_is_right_associative_and_binds_tighter_than_unary() {
    assert_eq!(expr_of("2 ^ 3 ^ 2"), "(2 ^ (3 ^ 2))");
    assert_eq!(expr_of("-2 ^ 2"), "(-(2 ^ 2))");
    assert_eq!(expr_of("2 ^ -1"), "(2 ^ (-1))");
}

#[test]
fn test_ternary() {
    assert_eq!(expr_of("a > 0 ? 1 : b ? 2 : 3"), "((a > 0) ? 1 : (b ? 2 : 3))");
}

#[test]
fn test_calls_and_lists() {
    assert_eq!(expr_of("max(x(), y())"), "max(x(), y())");
    assert_eq!(expr_of("mean([1, 2, 3])"), "mean([1, 2, 3])");
    assert_eq!(expr_of("null()"), "null()");
    assert_eq!(expr_of("[]"), "[]");
}

#[test]
fn test_image_specs() {
    assert_eq!(expr_of("src[1]"), "src[1]");
    assert_eq!(expr_of("src[-1, 0]"), "src[(-1), 0]");
    assert_eq!(expr_of("src[$0, $y()][2]"), "src[$0, $y()][2]");
    assert_eq!(expr_of("src[$5, 1]"), "src[$5, 1]");
}

#[test]
fn test_dollar_on_band_is_error() {
    let (output, _) = parse_str("a = src[$1];");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E1006);
}

#[test]
fn test_header_blocks() {
    let source = "options { outside = -1; }\n\
                  images { src = read; dest = write; }\n\
                  init { k = 2; n; }\n\
                  dest = src * k;";
    let (script, interner) = parse_ok(source);
    assert_eq!(script.options.len(), 1);
    assert_eq!(script.options[0].value, OptionValue::Number(-1.0));
    let images: Vec<_> = script
        .images
        .iter()
        .map(|d| (interner.lookup(d.name), d.role))
        .collect();
    assert_eq!(
        images,
        vec![("src", ImageRole::Source), ("dest", ImageRole::Dest)]
    );
    assert_eq!(script.init.len(), 2);
    assert!(script.init[0].default.is_some());
    assert!(script.init[1].default.is_none());
    assert_eq!(script.body.len(), 1);
}

#[test]
fn test_option_values() {
    let (script, interner) = parse_ok("options { a = null; b = NaN; c = M_PI; d = true; }");
    let values: Vec<_> = script.options.iter().map(|o| o.value).collect();
    assert_eq!(values[0], OptionValue::Null);
    assert_eq!(values[1], OptionValue::Null);
    assert!(matches!(values[2], OptionValue::Ident(n) if interner.lookup(n) == "M_PI"));
    assert_eq!(values[3], OptionValue::Bool(true));
}

#[test]
fn test_header_after_body_is_error() {
    let (output, _) = parse_str("a = 1; init { k = 1; }");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E1005);
    assert_eq!(output.script.init.len(), 1);
}

#[test]
fn test_assignment_statements() {
    let (script, _) = parse_ok("a = 1; a += 2; a %= 3; a++; --a;");
    let ops: Vec<_> = script
        .body
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Assign { op, .. } => format!("assign {}", op.symbol()),
            StmtKind::IncDec { op, prefix, .. } => format!("{} prefix={prefix}", op.symbol()),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(
        ops,
        vec![
            "assign =",
            "assign +=",
            "assign %=",
            "++ prefix=false",
            "-- prefix=true"
        ]
    );
    assert!(matches!(
        script.body[1].kind,
        StmtKind::Assign {
            op: AssignOp::Add,
            ..
        }
    ));
    assert!(matches!(
        script.body[4].kind,
        StmtKind::IncDec {
            op: IncDec::Dec,
            ..
        }
    ));
}

#[test]
fn test_control_flow() {
    let source = "if (a) { b = 1; } else c = 2;\n\
                  while (i < 10) i++;\n\
                  until (done) { breakif(x); break; }\n\
                  foreach (v in 1:10) s += v;\n\
                  foreach (w in [1, 2]) ;";
    let (script, interner) = parse_ok(source);
    assert_eq!(script.body.len(), 5);

    match &script.body[0].kind {
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            assert!(matches!(then_branch.kind, StmtKind::Block(ref s) if s.len() == 1));
            assert!(else_branch.is_some());
        }
        other => panic!("expected if, got {other:?}"),
    }
    assert!(matches!(script.body[1].kind, StmtKind::While { .. }));
    match &script.body[2].kind {
        StmtKind::Until { body, .. } => match &body.kind {
            StmtKind::Block(stmts) => {
                assert!(matches!(stmts[0].kind, StmtKind::BreakIf(_)));
                assert!(matches!(stmts[1].kind, StmtKind::Break));
            }
            other => panic!("expected block, got {other:?}"),
        },
        other => panic!("expected until, got {other:?}"),
    }
    match &script.body[3].kind {
        StmtKind::Foreach { var, source, .. } => {
            assert_eq!(interner.lookup(*var), "v");
            assert_eq!(show(&script, &interner, *source), "1:10");
        }
        other => panic!("expected foreach, got {other:?}"),
    }
    match &script.body[4].kind {
        StmtKind::Foreach { source, body, .. } => {
            assert_eq!(show(&script, &interner, *source), "[1, 2]");
            assert!(matches!(body.kind, StmtKind::Empty));
        }
        other => panic!("expected foreach, got {other:?}"),
    }
}

#[test]
fn test_statement_ids_are_unique() {
    let (script, _) = parse_ok("if (a) { b = 1; c = 2; } d = 3;");
    fn collect(stmt: &rasc_ir::Stmt, out: &mut Vec<u32>) {
        out.push(stmt.id.index() as u32);
        match &stmt.kind {
            StmtKind::Block(stmts) => stmts.iter().for_each(|s| collect(s, out)),
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect(then_branch, out);
                if let Some(e) = else_branch {
                    collect(e, out);
                }
            }
            _ => {}
        }
    }
    let mut ids = Vec::new();
    script.body.iter().for_each(|s| collect(s, &mut ids));
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
    assert_eq!(script.stmt_count, 5);
}

#[test]
fn test_recovers_and_reports_every_error() {
    let (output, _) = parse_str("a = ;\nb = 1 +;\nc = 3;");
    let codes: Vec<_> = output.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ErrorCode::E1002, ErrorCode::E1002]);
    assert_eq!(output.script.body.len(), 1);
}

#[test]
fn test_missing_semicolon_inside_block_keeps_block() {
    let (output, _) = parse_str("if (a) { b = 1 } c = 2;");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E1001);
    assert_eq!(output.script.body.len(), 2);
}

#[test]
fn test_unclosed_paren() {
    let (output, _) = parse_str("a = (1 + 2");
    assert_eq!(output.diagnostics[0].code, ErrorCode::E1003);
    assert_eq!(output.diagnostics[0].labels.len(), 2);
}

#[test]
fn test_assignment_to_expression_rejected() {
    let (output, _) = parse_str("src[1, 1] = 4;");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E1001);
}

#[test]
fn test_unmatched_close_brace() {
    let (output, _) = parse_str("a = 1; } b = 2;");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.script.body.len(), 2);
}

#[test]
fn test_unary_ops() {
    let (script, _) = parse_ok("a = +-!b;");
    let StmtKind::Assign { value, .. } = &script.body[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::Unary { op, operand } = script.arena.kind(*value) else {
        panic!("expected unary");
    };
    assert_eq!(*op, UnaryOp::Plus);
    assert!(matches!(
        script.arena.kind(*operand),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            ..
        }
    ));
    assert!(!parse_str("a = 1;").0.has_errors());
}
