//! Diagnostic system for the rasc compiler.
//!
//! Every phase reports problems as [`Diagnostic`] values:
//! - an [`ErrorCode`] for searchability
//! - a message saying what went wrong
//! - labeled spans saying where
//!
//! Phases never abort on the first problem. They push into a
//! [`DiagnosticBag`] and the driver decides whether to continue.

mod bag;
mod diagnostic;
pub mod emitter;
mod error_code;
mod span_utils;

pub use bag::{DiagnosticBag, DiagnosticConfig};
pub use diagnostic::{
    undefined_variable, unexpected_token, Diagnostic, Label, Severity, SourcePos,
};
pub use emitter::{ColorMode, TerminalEmitter};
pub use error_code::ErrorCode;
pub use span_utils::LineOffsetTable;
