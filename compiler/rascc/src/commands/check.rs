//! The `check` command: compile a script and report diagnostics.

use rasc_registry::Registry;

use super::{emit_diagnostics, fail_compile, read_file};
use crate::{compile, CompileOptions, ExecModel};

pub fn check_file(path: &str) {
    let source = read_file(path);
    let registry = Registry::standard();
    match compile(&source, &CompileOptions::new(ExecModel::Direct), &registry) {
        Ok(output) => {
            emit_diagnostics(path, &source, &output.warnings);
            let script = &output.script;
            println!(
                "OK: {path} ({} images, {} image variables, {} statements)",
                script.image_params.len(),
                script.image_vars.len(),
                script.body.len()
            );
        }
        Err(error) => fail_compile(path, &source, &error),
    }
}
