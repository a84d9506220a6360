//! The rasc compiler driver.
//!
//! [`compile`] runs the whole front end over one script:
//! lex → parse → image parameters → resolve and check → lower.
//! Syntax errors stop before resolution. Semantic errors, including an
//! execution model that cannot serve the script's images, are collected and
//! returned together, every diagnostic tagged with its line and column.

pub mod commands;

use std::sync::Arc;

use rasc_diagnostic::{Diagnostic, DiagnosticBag, DiagnosticConfig};
use rasc_ir::{ImageParams, StringInterner};
use rasc_registry::Registry;

pub use rasc_lower::{CompiledScript, ExecModel};

/// How to compile a script.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    pub model: ExecModel,
    /// Image roles supplied by the caller. `None` takes them from the
    /// script's `images` block.
    pub image_params: Option<ImageParams>,
    pub diagnostics: DiagnosticConfig,
}

impl CompileOptions {
    pub fn new(model: ExecModel) -> Self {
        CompileOptions {
            model,
            image_params: None,
            diagnostics: DiagnosticConfig::default(),
        }
    }

    #[must_use]
    pub fn with_image_params(mut self, params: ImageParams) -> Self {
        self.image_params = Some(params);
        self
    }
}

/// A successful compile.
#[derive(Clone, Debug)]
pub struct CompileOutput {
    pub script: Arc<CompiledScript>,
    pub warnings: Vec<Diagnostic>,
}

/// A failed compile. Diagnostic lists hold warnings as well as errors.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("script is empty")]
    EmptyScript,
    #[error("no image parameters: none supplied and the script declares none")]
    NoImageParameters,
    #[error("{} syntax error(s)", count_errors(.0))]
    Syntax(Vec<Diagnostic>),
    #[error("{} error(s)", count_errors(.0))]
    Semantic(Vec<Diagnostic>),
}

impl CompileError {
    /// Diagnostics carried by the error; empty for the fatal conditions.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::EmptyScript | CompileError::NoImageParameters => &[],
            CompileError::Syntax(diagnostics) | CompileError::Semantic(diagnostics) => diagnostics,
        }
    }
}

fn count_errors(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

/// Compile `source` against `registry`.
#[tracing::instrument(level = "debug", skip_all, fields(model = %options.model))]
pub fn compile(
    source: &str,
    options: &CompileOptions,
    registry: &Registry,
) -> Result<CompileOutput, CompileError> {
    if source.trim().is_empty() {
        return Err(CompileError::EmptyScript);
    }

    let mut bag = DiagnosticBag::with_config(options.diagnostics.clone());
    let mut interner = StringInterner::new();

    let lexed = rasc_lexer::lex(source, &mut interner);
    bag.extend(lexed.diagnostics);
    let parsed = rasc_parse::parse(&lexed.tokens);
    bag.extend(parsed.diagnostics);
    if bag.has_errors() {
        bag.resolve_positions(source);
        return Err(CompileError::Syntax(bag.into_vec()));
    }
    let script = parsed.script;

    let (image_params, image_diagnostics) =
        rasc_types::image_params_for(&script, &interner, options.image_params.as_ref());
    if image_params.is_empty() {
        return Err(CompileError::NoImageParameters);
    }
    bag.extend(image_diagnostics);

    let analysis = rasc_types::analyze(&script, &mut interner, registry, &image_params);
    bag.extend(analysis.diagnostics);
    bag.extend(rasc_lower::check_model(&analysis.typed, options.model));
    if bag.has_errors() {
        bag.resolve_positions(source);
        return Err(CompileError::Semantic(bag.into_vec()));
    }

    match rasc_lower::lower(&script, &interner, registry, &analysis.typed, options.model) {
        Ok(compiled) => {
            bag.resolve_positions(source);
            let warnings = bag.into_vec();
            tracing::debug!(warnings = warnings.len(), "compile complete");
            Ok(CompileOutput {
                script: Arc::new(compiled),
                warnings,
            })
        }
        Err(errors) => {
            bag.extend(errors);
            bag.resolve_positions(source);
            Err(CompileError::Semantic(bag.into_vec()))
        }
    }
}
