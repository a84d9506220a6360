//! Compile scripts for runtime tests.

use std::sync::Arc;

use rasc_ir::{ImageParams, ImageRole, StringInterner};
use rasc_lower::{CompiledScript, ExecModel};
use rasc_registry::Registry;

/// Compile `source` with the given image roles, panicking on any error.
pub(crate) fn compile(
    source: &str,
    images: &[(&str, ImageRole)],
    model: ExecModel,
) -> Arc<CompiledScript> {
    let mut params = ImageParams::new();
    for &(name, role) in images {
        assert!(params.insert(name, role).is_ok());
    }
    let mut interner = StringInterner::new();
    let lexed = rasc_lexer::lex(source, &mut interner);
    assert!(lexed.diagnostics.is_empty(), "{:?}", lexed.diagnostics);
    let parsed = rasc_parse::parse(&lexed.tokens);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let registry = Registry::standard();
    let analysis = rasc_types::analyze(&parsed.script, &mut interner, &registry, &params);
    assert!(!analysis.has_errors(), "{:?}", analysis.diagnostics);
    match rasc_lower::lower(&parsed.script, &interner, &registry, &analysis.typed, model) {
        Ok(script) => Arc::new(script),
        Err(diagnostics) => panic!("{diagnostics:?}"),
    }
}

/// `src` source and `out` destination, direct model.
pub(crate) fn compile_direct(source: &str) -> Arc<CompiledScript> {
    compile(
        source,
        &[("src", ImageRole::Source), ("out", ImageRole::Dest)],
        ExecModel::Direct,
    )
}
