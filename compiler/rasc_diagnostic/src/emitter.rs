//! Terminal emitter
//!
//! Human-readable diagnostic output with optional ANSI color support and
//! a one-line source excerpt under each positioned diagnostic.

use std::io::{self, Write};

use crate::{Diagnostic, LineOffsetTable, Severity};

mod colors {
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const WARNING: &str = "\x1b[1;33m"; // Bold yellow
    pub const BOLD: &str = "\x1b[1m";
    pub const SECONDARY: &str = "\x1b[1;34m"; // Bold blue
    pub const RESET: &str = "\x1b[0m";
}

#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Color output mode for the terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Use colors when the output is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Writes diagnostics for one script.
pub struct TerminalEmitter<'src, W: Write> {
    writer: W,
    colors: bool,
    path: &'src str,
    source: &'src str,
    lines: LineOffsetTable,
}

impl<'src, W: Write> TerminalEmitter<'src, W> {
    pub fn new(writer: W, mode: ColorMode, is_tty: bool, path: &'src str, source: &'src str) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
            path,
            source,
            lines: LineOffsetTable::build(source),
        }
    }

    fn write_colored(&mut self, text: &str, color: &str) -> io::Result<()> {
        if self.colors {
            write!(self.writer, "{color}{text}{}", colors::RESET)
        } else {
            write!(self.writer, "{text}")
        }
    }

    fn severity_color(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => colors::ERROR,
            Severity::Warning => colors::WARNING,
        }
    }

    pub fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        // severity[CODE]: message
        let color = Self::severity_color(diagnostic.severity);
        self.write_colored(&diagnostic.severity.to_string(), color)?;
        self.write_colored(&format!("[{}]", diagnostic.code), colors::BOLD)?;
        writeln!(self.writer, ": {}", diagnostic.message)?;

        for label in &diagnostic.labels {
            let (line, column) = self.lines.offset_to_line_col(self.source, label.span.start);
            let marker = if label.is_primary { "-->" } else { "   " };
            writeln!(self.writer, "  {marker} {}:{line}:{column}", self.path)?;

            if let Some(text) = self.lines.line_text(self.source, line) {
                let text = text.to_owned();
                let width = text.chars().count().saturating_sub(column as usize - 1);
                let carets = (label.span.len() as usize).clamp(1, width.max(1));
                writeln!(self.writer, "   | {text}")?;
                write!(self.writer, "   | {}", " ".repeat(column as usize - 1))?;
                let underline = format!("{} {}", "^".repeat(carets), label.message);
                let color = if label.is_primary {
                    color
                } else {
                    colors::SECONDARY
                };
                self.write_colored(&underline, color)?;
                writeln!(self.writer)?;
            }
        }

        for note in &diagnostic.notes {
            write!(self.writer, "   = ")?;
            self.write_colored("note", colors::BOLD)?;
            writeln!(self.writer, ": {note}")?;
        }

        writeln!(self.writer)
    }

    pub fn emit_all(&mut self, diagnostics: &[Diagnostic]) -> io::Result<()> {
        for diag in diagnostics {
            self.emit(diag)?;
        }
        Ok(())
    }

    pub fn emit_summary(&mut self, error_count: usize, warning_count: usize) -> io::Result<()> {
        if error_count > 0 {
            self.write_colored("error", colors::ERROR)?;
            let error_part = if error_count == 1 {
                "previous error".to_string()
            } else {
                format!("{error_count} previous errors")
            };
            if warning_count > 0 {
                writeln!(
                    self.writer,
                    ": aborting due to {error_part}; {warning_count} warning{} emitted",
                    plural_s(warning_count)
                )?;
            } else {
                writeln!(self.writer, ": aborting due to {error_part}")?;
            }
        } else if warning_count > 0 {
            self.write_colored("warning", colors::WARNING)?;
            writeln!(
                self.writer,
                ": {warning_count} warning{} emitted",
                plural_s(warning_count)
            )?;
        }
        self.writer.flush()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use rasc_ir::Span;

    const SOURCE: &str = "dest = 1;\ndest += src;\n";

    fn render(mode: ColorMode, diags: &[Diagnostic]) -> String {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, mode, false, "t.rasc", SOURCE);
        emitter.emit_all(diags).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn sample() -> Diagnostic {
        Diagnostic::error(ErrorCode::E2005)
            .with_message("invalid assignment operator with destination image")
            .with_label(Span::new(15, 17), "only `=` may write a destination image")
            .with_note("destination images are write-only")
    }

    #[test]
    fn test_plain_output_has_excerpt() {
        let text = render(ColorMode::Never, &[sample()]);
        assert!(text.starts_with("error[E2005]: invalid assignment operator"));
        assert!(text.contains("--> t.rasc:2:6"));
        assert!(text.contains("   | dest += src;"));
        assert!(text.contains("^^ only `=`"));
        assert!(text.contains("note: destination images are write-only"));
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn test_colored_output() {
        let text = render(ColorMode::Always, &[sample()]);
        assert!(text.contains("\x1b[1;31m"));
        assert!(text.contains("E2005"));
    }

    #[test]
    fn test_summary() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, ColorMode::Never, false, "t", "");
        emitter.emit_summary(2, 1).unwrap();
        emitter.emit_summary(0, 3).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("aborting due to 2 previous errors; 1 warning emitted"));
        assert!(text.contains("warning: 3 warnings emitted"));
    }

    #[test]
    fn test_color_mode() {
        assert!(ColorMode::Auto.should_use_colors(true));
        assert!(!ColorMode::Auto.should_use_colors(false));
        assert!(ColorMode::Always.should_use_colors(false));
        assert!(!ColorMode::Never.should_use_colors(true));
        assert_eq!(ColorMode::default(), ColorMode::Auto);
    }
}
