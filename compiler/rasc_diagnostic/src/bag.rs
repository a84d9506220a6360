//! Diagnostic collection.

use crate::{Diagnostic, LineOffsetTable};

/// Configuration for diagnostic collection.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors kept (0 = unlimited). Warnings are not counted.
    pub error_limit: usize,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig { error_limit: 50 }
    }
}

impl DiagnosticConfig {
    pub fn unlimited() -> Self {
        DiagnosticConfig { error_limit: 0 }
    }
}

/// Diagnostics in the order they were reported.
///
/// Passes push into a bag and keep going; the driver decides afterwards
/// whether the errors collected so far abort compilation.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    config: DiagnosticConfig,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticBag {
            diagnostics: Vec::new(),
            error_count: 0,
            config,
        }
    }

    /// Record a diagnostic. Errors past the configured limit are dropped.
    ///
    /// Returns `true` if the diagnostic was kept.
    pub fn push(&mut self, diag: Diagnostic) -> bool {
        if diag.is_error() {
            if self.limit_reached() {
                return false;
            }
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
        true
    }

    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.push(diag);
        }
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Fill in line/column for every diagnostic that has a primary span.
    pub fn resolve_positions(&mut self, source: &str) {
        let table = LineOffsetTable::build(source);
        for diag in &mut self.diagnostics {
            if diag.pos.is_none() {
                if let Some(span) = diag.primary_span() {
                    diag.pos = Some(table.position(source, span));
                }
            }
        }
    }

    /// Split into (errors, warnings), each in report order.
    pub fn partition(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        self.diagnostics.into_iter().partition(Diagnostic::is_error)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCode, SourcePos};
    use rasc_ir::Span;

    fn err(msg: &str) -> Diagnostic {
        Diagnostic::error(ErrorCode::E2001).with_message(msg)
    }

    #[test]
    fn test_error_limit_drops_errors_not_warnings() {
        let mut bag = DiagnosticBag::with_config(DiagnosticConfig { error_limit: 2 });
        assert!(bag.push(err("a")));
        assert!(bag.push(err("b")));
        assert!(!bag.push(err("c")));
        assert!(bag.push(Diagnostic::warning(ErrorCode::W5001).with_message("w")));
        assert_eq!(bag.error_count(), 2);
        assert_eq!(bag.warning_count(), 1);
        assert!(bag.limit_reached());
    }

    #[test]
    fn test_unlimited() {
        let mut bag = DiagnosticBag::with_config(DiagnosticConfig::unlimited());
        for _ in 0..200 {
            bag.push(err("x"));
        }
        assert_eq!(bag.len(), 200);
        assert!(!bag.limit_reached());
    }

    #[test]
    fn test_resolve_positions_and_partition() {
        let source = "a = 1;\n  b = q;";
        let mut bag = DiagnosticBag::new();
        bag.push(err("undefined").with_label(Span::new(13, 14), "here"));
        bag.push(Diagnostic::warning(ErrorCode::W5002).with_message("no span"));
        bag.resolve_positions(source);
        let (errors, warnings) = bag.partition();
        assert_eq!(errors[0].pos, Some(SourcePos { line: 2, column: 7 }));
        assert_eq!(warnings[0].pos, None);
    }
}
