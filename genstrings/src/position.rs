//! Byte offset to line/column conversion.

/// Precomputed newline offsets of one source buffer.
///
/// A newline counts as column 0 of the line that follows it: in `"abc\nabc"`
/// the `\n` at offset 3 is line 2, column 0, and the `a` after it is line 2,
/// column 1. On the first line the column is `offset + 1`.
#[derive(Debug, Clone)]
pub struct LineIndex {
    len: usize,
    newlines: Vec<usize>,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let newlines = src
            .char_indices()
            .filter(|&(_, c)| c == '\n')
            .map(|(offset, _)| offset)
            .collect();
        LineIndex {
            len: src.len(),
            newlines,
        }
    }

    /// Returns `(line, col)` for `offset`, or `(0, 0)` when the offset lies
    /// outside `[0, len)`.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        if offset >= self.len {
            return (0, 0);
        }
        let preceding = self.newlines.partition_point(|&newline| newline <= offset);
        let col = match preceding {
            0 => offset + 1,
            n => offset - self.newlines[n - 1],
        };
        (preceding + 1, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_offsets() {
        let cases = [
            ("\na", 1, (2, 1)),
            ("abc\nabc\n", 0, (1, 1)),
            ("abc\nabc\n", 1, (1, 2)),
            ("abc\nabc\n", 2, (1, 3)),
            ("abc\nabc\n", 3, (2, 0)),
            ("abc\nabc\n", 4, (2, 1)),
            ("abc\nabc\n", 5, (2, 2)),
            ("abc\nabc\n", 6, (2, 3)),
            ("abc\nabc\n", 7, (3, 0)),
            ("abc\nabc\n", 8, (0, 0)),
        ];
        for (src, offset, expected) in cases {
            let index = LineIndex::new(src);
            assert_eq!(index.line_col(offset), expected, "{src:?} @ {offset}");
        }
    }

    #[test]
    fn test_empty_source_has_no_positions() {
        let index = LineIndex::new("");
        assert_eq!(index.line_col(0), (0, 0));
    }

    #[test]
    fn test_multibyte_columns_count_bytes() {
        let index = LineIndex::new("é\nx");
        // `é` is two bytes wide, so the newline sits at offset 2.
        assert_eq!(index.line_col(2), (2, 0));
        assert_eq!(index.line_col(3), (2, 1));
    }
}
