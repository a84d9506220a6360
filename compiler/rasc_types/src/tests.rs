use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rasc_diagnostic::ErrorCode;
use rasc_ir::{ImageRole, StmtKind, ValueType};

struct Analyzed {
    output: AnalysisOutput,
    script: Script,
    interner: StringInterner,
}

impl Analyzed {
    fn codes(&self) -> Vec<ErrorCode> {
        self.output.diagnostics.iter().map(|d| d.code).collect()
    }

    fn has(&self, code: ErrorCode) -> bool {
        self.codes().contains(&code)
    }

    fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        let name = self.interner.get(name)?;
        self.output
            .typed
            .resolution
            .symbols
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(_, s)| s.kind)
    }

    /// Type of the value of the last top-level assignment.
    fn last_value_type(&self) -> Option<ValueType> {
        self.script.body.iter().rev().find_map(|stmt| match &stmt.kind {
            StmtKind::Assign { value, .. } => Some(self.output.typed.expr_type(*value)),
            _ => None,
        })
    }
}

fn analyze_with(source: &str, caller: Option<&ImageParams>) -> Analyzed {
    let mut interner = StringInterner::new();
    let lexed = rasc_lexer::lex(source, &mut interner);
    assert!(lexed.diagnostics.is_empty(), "lex errors: {:?}", lexed.diagnostics);
    let parsed = rasc_parse::parse(&lexed.tokens);
    assert!(parsed.diagnostics.is_empty(), "parse errors: {:?}", parsed.diagnostics);
    let script = parsed.script;

    let registry = Registry::standard();
    let (params, mut diagnostics) = image_params_for(&script, &interner, caller);
    let mut output = analyze(&script, &mut interner, &registry, &params);
    diagnostics.append(&mut output.diagnostics);
    output.diagnostics = diagnostics;
    Analyzed {
        output,
        script,
        interner,
    }
}

/// `src` is a source image, `out` a destination.
fn analyze_src(source: &str) -> Analyzed {
    let params = ImageParams::new()
        .with("src", ImageRole::Source)
        .and_then(|p| p.with("out", ImageRole::Dest));
    match params {
        Ok(params) => analyze_with(source, Some(&params)),
        Err(err) => panic!("{err}"),
    }
}

fn assert_clean(analyzed: &Analyzed) {
    let errors: Vec<_> = analyzed
        .output
        .diagnostics
        .iter()
        .filter(|d| d.is_error())
        .collect();
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

// Scoping

#[test]
fn test_block_local_does_not_leak() {
    let analyzed = analyze_src("if (src > 0) { a = 1; } out = a;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2001]);
}

#[test]
fn test_unbraced_branch_gets_its_own_scope() {
    let analyzed = analyze_src("while (src > 0) a = 1; out = a;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2001]);
}

#[test]
fn test_outer_variable_is_visible_and_assignable_inside_block() {
    let analyzed = analyze_src("a = 1; if (src) { a = 2; } out = a;");
    assert_clean(&analyzed);
    let locals = analyzed
        .output
        .typed
        .resolution
        .symbols
        .iter()
        .filter(|(_, s)| analyzed.interner.lookup(s.name) == "a")
        .count();
    assert_eq!(locals, 1);
}

#[test]
fn test_loop_variable_is_scoped_to_loop() {
    let analyzed = analyze_src("foreach (i in [1, 2]) { out = i + src; } out = i;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2001]);
}

// Image roles

#[test]
fn test_write_to_source_image() {
    let analyzed = analyze_src("src = 1; out = 0;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2004]);
}

#[test]
fn test_read_destination_image() {
    let analyzed = analyze_src("a = out; out = src;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2006]);
    let analyzed = analyze_src("out = out[1, 0];");
    assert!(analyzed.has(ErrorCode::E2006));
}

#[test]
fn test_compound_assignment_to_destination() {
    for source in ["out += src;", "out *= 2;", "out++;", "--out;"] {
        let analyzed = analyze_src(source);
        assert!(analyzed.has(ErrorCode::E2005), "{source}: {:?}", analyzed.codes());
    }
}

#[test]
fn test_compound_destination_error_survives_other_errors() {
    let analyzed = analyze_src("q = missing + 1; out += src; z = nofunc(2);");
    let codes = analyzed.codes();
    assert!(codes.contains(&ErrorCode::E2001));
    assert!(codes.contains(&ErrorCode::E2005));
    assert!(codes.contains(&ErrorCode::E2009));
}

#[test]
fn test_indexing_a_non_image() {
    let analyzed = analyze_src("v = 1; out = v[0, 1] + src;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2010]);
}

#[test]
fn test_unused_image_warns() {
    let analyzed = analyze_src("out = 1;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::W5001]);
    assert!(!analyzed.output.has_errors());
}

// Names

#[test]
fn test_constants_are_read_only() {
    let analyzed = analyze_src("M_PI = 3; out = src;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2007]);

    let analyzed = analyze_src("out = src * M_PI;");
    assert_clean(&analyzed);
    let has_constant = analyzed
        .output
        .typed
        .resolution
        .expr_refs
        .iter()
        .any(|r| matches!(r, Some(NameRef::Constant(v)) if *v == std::f64::consts::PI));
    assert!(has_constant);
}

#[test]
fn test_loop_variable_is_read_only() {
    let analyzed = analyze_src("foreach (i in 1:3) { i = 2; out = src; }");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2008]);
}

#[test]
fn test_undefined_function() {
    let analyzed = analyze_src("out = frobnicate(src);");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2009]);
}

#[test]
fn test_con_argument_count() {
    let analyzed = analyze_src("out = con();");
    assert!(analyzed.has(ErrorCode::E3004));
    let analyzed = analyze_src("out = con(src, 1, 2, 3, 4);");
    assert!(analyzed.has(ErrorCode::E3004));
    let analyzed = analyze_src("out = con(src, 1, 2, 3);");
    assert_clean(&analyzed);
}

#[test]
fn test_break_outside_loop() {
    let analyzed = analyze_src("out = src; break;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2012]);
    let analyzed = analyze_src("out = src; foreach (i in [1]) { breakif(i > 0); }");
    assert_clean(&analyzed);
}

// Header blocks

#[test]
fn test_init_variables_live_in_image_scope() {
    let analyzed = analyze_src("init { k = 2; n; } out = src * k + n;");
    assert_clean(&analyzed);
    assert_eq!(analyzed.kind_of("k"), Some(SymbolKind::Scalar));
    let k = analyzed.output.typed.resolution.init_symbols[0];
    let symbol = k.map(|id| analyzed.output.typed.resolution.symbols.symbol(id).clone());
    assert!(symbol.is_some_and(|s| s.is_image_scope()));
}

#[test]
fn test_init_redeclarations() {
    let analyzed = analyze_src("init { src = 1; } out = src;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2003]);
    let analyzed = analyze_src("init { k = 1; k = 2; } out = src + k;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E2002]);
}

#[test]
fn test_options_are_applied_or_warned() {
    let analyzed = analyze_src(
        "options { outside = -1; speed = 2; outside = true; } out = src;",
    );
    assert_eq!(analyzed.codes(), vec![ErrorCode::W5002, ErrorCode::W5003]);
    assert_eq!(analyzed.output.typed.resolution.options.outside, Some(-1.0));
}

#[test]
fn test_images_block_used_without_caller_map() {
    let analyzed = analyze_with("images { a = read; b = write; } b = a;", None);
    assert_clean(&analyzed);
    let params = &analyzed.output.typed.resolution.image_params;
    assert_eq!(params.role("a"), Some(ImageRole::Source));
    assert_eq!(params.role("b"), Some(ImageRole::Dest));
}

#[test]
fn test_images_block_conflicts() {
    let analyzed = analyze_with("images { a = read; a = write; } x = 1;", None);
    assert!(analyzed.has(ErrorCode::E2011));
    let analyzed = analyze_with("images { a = read; a = read; } x = a;", None);
    assert!(analyzed.has(ErrorCode::E2002));
}

#[test]
fn test_images_block_ignored_with_caller_map() {
    let analyzed = analyze_src("images { zz = read; } out = src;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::W5004]);
}

// Types

#[test]
fn test_first_assignment_settles_kind() {
    let analyzed = analyze_src("l = [1, 2]; s = 1; out = src;");
    assert_clean(&analyzed);
    assert_eq!(analyzed.kind_of("l"), Some(SymbolKind::List));
    assert_eq!(analyzed.kind_of("s"), Some(SymbolKind::Scalar));

    let analyzed = analyze_src("s = 1; s = [1, 2]; out = src;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E3001]);
    assert_eq!(analyzed.kind_of("s"), Some(SymbolKind::Scalar));
}

#[test]
fn test_list_to_destination_is_rejected() {
    let analyzed = analyze_src("out = [src, 1];");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E3001]);
}

#[test]
fn test_list_where_scalar_required() {
    for source in [
        "out = src ^ [1, 2];",
        "if ([1]) { out = src; }",
        "out = [1] ? src : 0;",
        "out = con([1], src);",
        "foreach (i in [1]:3) { out = src; }",
        "out = src[[1], 0];",
    ] {
        let analyzed = analyze_src(source);
        assert!(analyzed.has(ErrorCode::E3002), "{source}: {:?}", analyzed.codes());
    }
}

#[test]
fn test_exponent_keeps_base_type() {
    let analyzed = analyze_src("l = [1, 2] ^ 2; out = src;");
    assert_clean(&analyzed);
    assert_eq!(analyzed.kind_of("l"), Some(SymbolKind::List));
}

#[test]
fn test_no_matching_signature() {
    let analyzed = analyze_src("out = sin([1, 2]) + src;");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E3003]);
    let diag = &analyzed.output.diagnostics[0];
    assert!(diag.notes.iter().any(|n| n.contains("sin(scalar) -> scalar")));
}

#[test]
fn test_reductions_and_calls_select_signatures() {
    let analyzed = analyze_src("out = max([src, 1, 2]) + min(src, 3) + x();");
    assert_clean(&analyzed);
    assert_eq!(analyzed.last_value_type(), Some(ValueType::Scalar));
    let chosen = analyzed.output.typed.calls.iter().flatten().count();
    // max, min, x and two additions
    assert_eq!(chosen, 5);
}

#[test]
fn test_foreach_over_scalar() {
    let analyzed = analyze_src("foreach (i in src) { out = i; }");
    assert_eq!(analyzed.codes(), vec![ErrorCode::E3001]);
}

#[test]
fn test_con_branches_combine() {
    let analyzed = analyze_src("l = con(src, [1], 2); out = src;");
    assert_clean(&analyzed);
    assert_eq!(analyzed.kind_of("l"), Some(SymbolKind::List));
}

fn literal(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Scalar => "2",
        ValueType::List => "[1, 2]",
    }
}

proptest! {
    /// Same-typed operands keep their type; mixed ones become a list.
    #[test]
    fn prop_binary_type_propagation(
        left in prop_oneof![Just(ValueType::Scalar), Just(ValueType::List)],
        right in prop_oneof![Just(ValueType::Scalar), Just(ValueType::List)],
        op in prop_oneof![
            Just("+"), Just("-"), Just("*"), Just("/"), Just("%"),
            Just("=="), Just("<"), Just(">="), Just("&&"), Just("||"), Just("^|"),
        ],
    ) {
        let source = format!(
            "a = {}; b = {}; c = a {op} b; out = src;",
            literal(left),
            literal(right)
        );
        let analyzed = analyze_src(&source);
        prop_assert!(!analyzed.output.has_errors(), "{:?}", analyzed.codes());
        prop_assert_eq!(analyzed.kind_of("c"), Some(SymbolKind::from(left.combine(right))));
    }
}
