use super::*;
use crate::ir::{Con, Expr, ExprKind, Stmt, Target};
use pretty_assertions::assert_eq;
use rasc_diagnostic::ErrorCode;
use rasc_ir::ImageRole;

fn params(entries: &[(&str, ImageRole)]) -> ImageParams {
    let mut params = ImageParams::new();
    for &(name, role) in entries {
        assert!(params.insert(name, role).is_ok());
    }
    params
}

fn compile_with(
    source: &str,
    images: &[(&str, ImageRole)],
    model: ExecModel,
) -> Result<CompiledScript, Vec<Diagnostic>> {
    let mut interner = StringInterner::new();
    let lexed = rasc_lexer::lex(source, &mut interner);
    assert!(lexed.diagnostics.is_empty(), "lex errors: {:?}", lexed.diagnostics);
    let parsed = rasc_parse::parse(&lexed.tokens);
    assert!(parsed.diagnostics.is_empty(), "parse errors: {:?}", parsed.diagnostics);
    let registry = Registry::standard();
    let analysis = rasc_types::analyze(&parsed.script, &mut interner, &registry, &params(images));
    assert!(!analysis.has_errors(), "analysis errors: {:?}", analysis.diagnostics);
    lower(&parsed.script, &interner, &registry, &analysis.typed, model)
}

/// `src` source, `out` destination, direct model.
fn compile(source: &str) -> CompiledScript {
    let images = [("src", ImageRole::Source), ("out", ImageRole::Dest)];
    match compile_with(source, &images, ExecModel::Direct) {
        Ok(script) => script,
        Err(diagnostics) => panic!("lowering failed: {diagnostics:?}"),
    }
}

/// Body rendered one statement per line, without the header.
fn body_text(script: &CompiledScript) -> Vec<String> {
    let text = script.to_string();
    text.lines()
        .skip_while(|line| !line.starts_with("locals"))
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[test]
fn test_direct_model_writes_destination() {
    let script = compile("out = x() + y() + src;");
    assert_eq!(script.model, ExecModel::Direct);
    assert_eq!(body_text(&script), vec!["write out <- _add(_add(x(), y()), src);"]);
    assert!(matches!(script.body[0], Stmt::WriteDest { .. }));
}

#[test]
fn test_indirect_model_returns_value() {
    let images = [("src", ImageRole::Source), ("out", ImageRole::Dest)];
    let script = compile_with("out = src * 2;", &images, ExecModel::Indirect);
    let script = match script {
        Ok(script) => script,
        Err(d) => panic!("{d:?}"),
    };
    assert_eq!(body_text(&script), vec!["return _mul(src, 2);"]);
}

#[test]
fn test_indirect_model_allows_one_destination() {
    let images = [
        ("src", ImageRole::Source),
        ("a", ImageRole::Dest),
        ("b", ImageRole::Dest),
    ];
    let result = compile_with("a = src; b = src;", &images, ExecModel::Indirect);
    let codes: Vec<_> = result.err().unwrap_or_default().iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ErrorCode::E4001]);

    assert!(compile_with("a = src; b = src;", &images, ExecModel::Direct).is_ok());
}

#[test]
fn test_compound_assignment_is_read_modify_write() {
    let script = compile("a = 1; a += src; a++; out = a;");
    assert_eq!(
        body_text(&script),
        vec![
            "%0 = 1;",
            "%0 = _add(%0, src);",
            "%0 = _add(%0, 1);",
            "write out <- %0;",
        ]
    );
    assert_eq!(script.local_count, 1);
}

#[test]
fn test_decrement_uses_subtraction() {
    let script = compile("a = src; --a; out = a;");
    assert_eq!(body_text(&script)[1], "%0 = _sub(%0, 1);");
}

#[test]
fn test_constant_folding() {
    let script = compile("out = 2 * 3 + src - sqrt(16);");
    assert_eq!(body_text(&script), vec!["write out <- _sub(_add(6, src), 4);"]);

    let script = compile("out = src + (true + null);");
    assert_eq!(body_text(&script), vec!["write out <- _add(src, null);"]);

    let script = compile("out = src + sum([1, 2, 3]);");
    assert_eq!(body_text(&script), vec!["write out <- _add(src, 6);"]);
}

#[test]
fn test_volatile_calls_are_not_folded() {
    let script = compile("out = src + rand(1);");
    assert_eq!(body_text(&script), vec!["write out <- _add(src, rand(1));"]);
}

#[test]
fn test_ternary_lowers_to_con() {
    let script = compile("out = src > 1 ? 1 : 2;");
    assert_eq!(
        body_text(&script),
        vec!["write out <- con(_truth(_gt(src, 1)), 1, 2);"]
    );
    let Stmt::WriteDest { value, .. } = &script.body[0] else {
        panic!("expected a write");
    };
    let ExprKind::Con(Con { branches, .. }) = &value.kind else {
        panic!("expected con");
    };
    assert_eq!(branches.len(), 2);
}

#[test]
fn test_con_forms() {
    for (source, branches) in [
        ("out = con(src);", 0),
        ("out = con(src, 1);", 1),
        ("out = con(src, 1, 2);", 2),
        ("out = con(src, 1, 2, 3);", 3),
    ] {
        let script = compile(source);
        let Stmt::WriteDest { value, .. } = &script.body[0] else {
            panic!("expected a write");
        };
        match &value.kind {
            ExprKind::Con(con) => assert_eq!(con.branches.len(), branches, "{source}"),
            other => panic!("{source}: {other:?}"),
        }
    }
}

#[test]
fn test_image_read_position_and_band() {
    let script = compile("out = src[1, $2][0] + src[-1, 0];");
    assert_eq!(
        body_text(&script),
        vec!["write out <- _add(src[1, $2][0], src[-1, 0]);"]
    );
}

#[test]
fn test_image_scope_variables() {
    let script = compile("init { k = M_PI; n; } out = src * k; k = k + 1;");
    assert_eq!(script.image_vars.len(), 2);
    assert_eq!(
        script.image_vars[0].default,
        Some(Expr::literal(std::f64::consts::PI))
    );
    assert_eq!(script.image_vars[1].default, None);
    assert_eq!(script.local_count, 0);
    assert!(matches!(
        script.body[1],
        Stmt::Assign {
            target: Target::ImageVar(_),
            ..
        }
    ));
    assert_eq!(script.image_var("n").map(|v| v.index()), Some(1));
}

#[test]
fn test_control_flow() {
    let script = compile(
        "n = 0;\n\
         foreach (i in 1:3) { n += i; breakif(n > 2); }\n\
         while (n < 10) n++;\n\
         until (n > 20) { n = n * 2; }\n\
         if (src) out = n; else out = 0;",
    );
    assert_eq!(
        body_text(&script),
        vec![
            "%0 = 0;",
            "foreach (%1 in 1:3) {",
            "    %0 = _add(%0, %1);",
            "    breakif (_gt(%0, 2));",
            "}",
            "while (_lt(%0, 10)) {",
            "    %0 = _add(%0, 1);",
            "}",
            "until (_gt(%0, 20)) {",
            "    %0 = _mul(%0, 2);",
            "}",
            "if (src) {",
            "    write out <- %0;",
            "} else {",
            "    write out <- 0;",
            "}",
        ]
    );
    assert_eq!(script.local_count, 2);
}

#[test]
fn test_header_rendering() {
    let script = compile("options { outside = 0; } init { k = 1; } out = src + k;");
    let text = script.to_string();
    let header: Vec<_> = text.lines().take(6).collect();
    assert_eq!(
        header,
        vec![
            "model direct",
            "image src: source",
            "image out: destination",
            "option outside = 0",
            "init k = 1",
            "locals 0",
        ]
    );
}

#[test]
fn test_lookup_helpers() {
    let script = compile("out = src;");
    assert_eq!(script.image_index("out").map(|i| i.index()), Some(1));
    assert_eq!(script.image_name(ImageIndex(0)), Some("src"));
    assert_eq!(script.image_role("out"), Some(ImageRole::Dest));
    assert_eq!(script.image_index("nope"), None);
}
