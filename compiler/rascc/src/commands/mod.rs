//! Command implementations for the `rasc` binary.
//!
//! Each command reports to stderr and exits the process with status 1 on
//! failure.

mod check;
mod ir;
mod run;

use std::io::IsTerminal;

use rasc_diagnostic::{ColorMode, Diagnostic, TerminalEmitter};

use crate::CompileError;

pub use check::check_file;
pub use ir::print_ir;
pub use run::{parse_run_options, run_file, RunOptions};

pub(crate) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                std::io::ErrorKind::InvalidData => {
                    format!("'{path}' contains invalid UTF-8 data")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("{msg}");
            std::process::exit(1);
        }
    }
}

/// Print `diagnostics` for `path` to stderr, followed by a summary line.
pub(crate) fn emit_diagnostics(path: &str, source: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let stderr = std::io::stderr();
    let is_tty = stderr.is_terminal();
    let mut emitter = TerminalEmitter::new(stderr.lock(), ColorMode::Auto, is_tty, path, source);
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;
    // Nothing useful to do if stderr is gone.
    let _ = emitter
        .emit_all(diagnostics)
        .and_then(|()| emitter.emit_summary(errors, warnings));
}

/// Report a failed compile and exit.
pub(crate) fn fail_compile(path: &str, source: &str, error: &CompileError) -> ! {
    match error {
        CompileError::EmptyScript | CompileError::NoImageParameters => {
            eprintln!("error: {path}: {error}");
        }
        CompileError::Syntax(diagnostics) | CompileError::Semantic(diagnostics) => {
            emit_diagnostics(path, source, diagnostics);
        }
    }
    std::process::exit(1);
}
