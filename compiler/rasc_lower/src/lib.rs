//! Lowering of checked scripts into the evaluable IR.
//!
//! One lowering pass serves both execution models; they differ only in
//! the statement produced for a destination-image assignment:
//! - [`ExecModel::Direct`] writes into the bound destination image.
//! - [`ExecModel::Indirect`] returns the value to the caller.
//!
//! Operators become calls to registry functions, `con(...)` and `?:`
//! become [`Con`](ir::Con) nodes, and pure calls over literals are folded.

mod fold;
pub mod ir;
mod lower;
mod render;

use std::fmt;

use rasc_diagnostic::Diagnostic;
use rasc_ir::{ImageParams, ImageRole, Script, StringInterner};
use rasc_registry::{Registry, ScriptOptions};
use rasc_types::TypedScript;

use crate::ir::{ImageIndex, ImageVarDecl, Stmt};

/// How results leave a compiled script.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ExecModel {
    /// Results are written into destination images by the script.
    #[default]
    Direct,
    /// The script returns one value per pixel; the caller stores it.
    Indirect,
}

impl fmt::Display for ExecModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecModel::Direct => write!(f, "direct"),
            ExecModel::Indirect => write!(f, "indirect"),
        }
    }
}

/// Result of a successful compile.
///
/// Immutable and free of per-run state: any number of runtimes may share
/// one behind an `Arc`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledScript {
    pub model: ExecModel,
    pub image_params: ImageParams,
    /// Image-scope variables in declaration order.
    pub image_vars: Vec<ImageVarDecl>,
    /// Number of pixel-scope variable slots.
    pub local_count: usize,
    pub body: Vec<Stmt>,
    pub options: ScriptOptions,
}

impl CompiledScript {
    pub fn image_name(&self, image: ImageIndex) -> Option<&str> {
        self.image_params.iter().nth(image.index()).map(|(n, _)| n)
    }

    pub fn image_index(&self, name: &str) -> Option<ImageIndex> {
        self.image_params
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| ImageIndex(i as u32))
    }

    pub fn image_role(&self, name: &str) -> Option<ImageRole> {
        self.image_params.role(name)
    }

    pub fn image_var(&self, name: &str) -> Option<ir::ImageVarId> {
        self.image_vars
            .iter()
            .position(|v| v.name == name)
            .map(|i| ir::ImageVarId(i as u32))
    }
}

/// E4001 when `model` cannot serve the script's destination images.
///
/// [`lower`] reports this too; drivers call it early so it joins the
/// resolution and type errors of the same compile.
pub fn check_model(typed: &TypedScript, model: ExecModel) -> Option<Diagnostic> {
    lower::check_model(typed, model)
}

/// Lower a script that resolved and type-checked without errors.
#[tracing::instrument(level = "debug", skip_all, fields(model = %model))]
pub fn lower(
    script: &Script,
    interner: &StringInterner,
    registry: &Registry,
    typed: &TypedScript,
    model: ExecModel,
) -> Result<CompiledScript, Vec<Diagnostic>> {
    let compiled = lower::Lowerer::new(script, interner, registry, typed, model).lower()?;
    tracing::debug!(
        statements = compiled.body.len(),
        locals = compiled.local_count,
        image_vars = compiled.image_vars.len(),
        "lowering complete"
    );
    Ok(compiled)
}

#[cfg(test)]
mod tests;
