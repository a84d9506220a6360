//! Symbol resolution and type checking for rasc scripts.
//!
//! Two passes over the parse tree:
//! - [`resolve`] builds the scope arena, classifies every identifier and
//!   reports misuse of images, constants and loop variables.
//! - [`check`] types every expression, selects registry signatures and
//!   settles implicitly declared variables from their first assignment.
//!
//! Both passes keep going after an error so one compile reports all of
//! them. Results live in side tables keyed by `ExprId` and `StmtId`.

mod check;
mod images;
mod resolve;
mod scope;

use rasc_diagnostic::Diagnostic;
use rasc_ir::{ImageParams, Script, StringInterner};
use rasc_registry::Registry;

pub use check::{check, CheckOutput, TypedScript};
pub use images::image_params_for;
pub use resolve::{resolve, NameRef, Resolution, ResolveOutput};
pub use scope::{ScopeId, Symbol, SymbolId, SymbolKind, SymbolTable};

/// Both passes, diagnostics in the order they were found.
pub struct AnalysisOutput {
    pub typed: TypedScript,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Resolve and type-check `script` against `image_params`.
pub fn analyze(
    script: &Script,
    interner: &mut StringInterner,
    registry: &Registry,
    image_params: &ImageParams,
) -> AnalysisOutput {
    let resolved = resolve(script, interner, registry, image_params);
    let checked = check(script, interner, registry, resolved.resolution);
    let mut diagnostics = resolved.diagnostics;
    diagnostics.extend(checked.diagnostics);
    AnalysisOutput {
        typed: checked.typed,
        diagnostics,
    }
}

#[cfg(test)]
mod tests;
