//! The `ir` command: print the lowered form of a script.

use rasc_registry::Registry;

use super::{emit_diagnostics, fail_compile, read_file};
use crate::{compile, CompileOptions, ExecModel};

pub fn print_ir(path: &str, model: ExecModel) {
    let source = read_file(path);
    let registry = Registry::standard();
    match compile(&source, &CompileOptions::new(model), &registry) {
        Ok(output) => {
            emit_diagnostics(path, &source, &output.warnings);
            print!("{}", output.script);
        }
        Err(error) => fail_compile(path, &source, &error),
    }
}
