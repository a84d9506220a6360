//! Byte offset to line/column conversion.

use rasc_ir::Span;

use crate::SourcePos;

/// Line start offsets for one source text, for O(log L) position lookup.
///
/// ```
/// use rasc_diagnostic::LineOffsetTable;
///
/// let source = "a = 1;\nb = 2;";
/// let table = LineOffsetTable::build(source);
/// assert_eq!(table.offset_to_line_col(source, 7), (2, 1));
/// ```
#[derive(Clone, Debug, Default)]
pub struct LineOffsetTable {
    /// `offsets[i]` is the byte offset where line `i + 1` starts.
    offsets: Vec<u32>,
}

impl LineOffsetTable {
    pub fn build(source: &str) -> Self {
        let mut offsets = vec![0u32];
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                offsets.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        LineOffsetTable { offsets }
    }

    /// 1-based line containing `offset`.
    #[inline]
    pub fn line_from_offset(&self, offset: u32) -> u32 {
        let line_idx = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        (line_idx as u32) + 1
    }

    /// 1-based (line, column); the column counts characters, not bytes.
    pub fn offset_to_line_col(&self, source: &str, offset: u32) -> (u32, u32) {
        let line = self.line_from_offset(offset);
        let line_start = self.offsets.get((line - 1) as usize).copied().unwrap_or(0) as usize;
        let end = (offset as usize).min(source.len());
        let col = source
            .get(line_start..end)
            .map_or(0, |text| text.chars().count());
        (line, u32::try_from(col).unwrap_or(u32::MAX - 1) + 1)
    }

    /// Position of the start of `span`.
    pub fn position(&self, source: &str, span: Span) -> SourcePos {
        let (line, column) = self.offset_to_line_col(source, span.start);
        SourcePos { line, column }
    }

    /// The text of a 1-based line, without its newline.
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = line.checked_sub(1)? as usize;
        let start = *self.offsets.get(idx)? as usize;
        let end = self
            .offsets
            .get(idx + 1)
            .map_or(source.len(), |next| *next as usize);
        source
            .get(start..end)
            .map(|s| s.trim_end_matches(['\n', '\r']))
    }

    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lookup() {
        let source = "line1\nline2\nline3";
        let table = LineOffsetTable::build(source);
        assert_eq!(table.line_count(), 3);
        assert_eq!(table.offset_to_line_col(source, 0), (1, 1));
        assert_eq!(table.offset_to_line_col(source, 5), (1, 6));
        assert_eq!(table.offset_to_line_col(source, 6), (2, 1));
        assert_eq!(table.offset_to_line_col(source, 14), (3, 3));
    }

    #[test]
    fn test_columns_count_chars() {
        let source = "é = 1;";
        let table = LineOffsetTable::build(source);
        // `=` sits at byte 3 but is the third character.
        assert_eq!(table.offset_to_line_col(source, 3), (1, 3));
    }

    #[test]
    fn test_line_text() {
        let source = "a;\r\nbb;\nccc";
        let table = LineOffsetTable::build(source);
        assert_eq!(table.line_text(source, 1), Some("a;"));
        assert_eq!(table.line_text(source, 2), Some("bb;"));
        assert_eq!(table.line_text(source, 3), Some("ccc"));
        assert_eq!(table.line_text(source, 4), None);
        assert_eq!(table.line_text(source, 0), None);
    }

    #[test]
    fn test_offset_past_end_clamps() {
        let source = "ab";
        let table = LineOffsetTable::build(source);
        assert_eq!(table.offset_to_line_col(source, 99), (1, 3));
    }
}
