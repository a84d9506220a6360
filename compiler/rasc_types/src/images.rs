//! Choosing the image parameters a script compiles against.

use rasc_diagnostic::{Diagnostic, ErrorCode};
use rasc_ir::{ImageParams, Script, StringInterner};

/// The image-parameter map for `script`.
///
/// A caller-supplied map wins; the script's `images` block is then ignored
/// with a warning. Otherwise the block is converted, reporting names listed
/// twice or with both roles.
pub fn image_params_for(
    script: &Script,
    interner: &StringInterner,
    caller: Option<&ImageParams>,
) -> (ImageParams, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    if let Some(params) = caller {
        if let Some(first) = script.images.first() {
            diagnostics.push(
                Diagnostic::warning(ErrorCode::W5004)
                    .with_message("`images` block ignored: image parameters were supplied by the caller")
                    .with_label(first.span, "ignored"),
            );
        }
        return (params.clone(), diagnostics);
    }

    let mut params = ImageParams::new();
    for decl in &script.images {
        let name = interner.lookup(decl.name);
        if let Err(err) = params.insert(name, decl.role) {
            let diag = if err.existing == decl.role {
                Diagnostic::error(ErrorCode::E2002)
                    .with_message(format!("image `{name}` is declared more than once"))
                    .with_label(decl.span, "duplicate declaration")
            } else {
                Diagnostic::error(ErrorCode::E2011)
                    .with_message(format!(
                        "image `{name}` cannot be both a source and a destination"
                    ))
                    .with_label(decl.span, format!("already declared as a {} image", err.existing))
            };
            diagnostics.push(diag);
        }
    }
    (params, diagnostics)
}
